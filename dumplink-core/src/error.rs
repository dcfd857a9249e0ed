//! Error types.
//!
//! The graph algorithms themselves never fail. Errors only arise where the
//! core meets its collaborators: applying commands to a store, and decoding
//! snapshots.

use thiserror::Error;

use crate::graph::BucketId;

/// Failure reported by a [`BoardStore`](crate::board::BoardStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("bucket {0} does not exist")]
    UnknownBucket(BucketId),

    #[error("dependency {dependent} -> {dependency} does not exist")]
    UnknownDependency { dependent: BucketId, dependency: BucketId },

    #[error("store rejected the update: {reason}")]
    Rejected { reason: String },
}

/// A subgraph move that would put some bucket outside the layers an
/// override may hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("moving {root} to layer {target_layer} would push {bucket} out of the layer range")]
pub struct LayerOutOfRange {
    pub root: BucketId,
    pub target_layer: i64,
    pub bucket: BucketId,
}

/// Failure of a board command.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("bucket {0} cannot depend on itself")]
    SelfDependency(BucketId),

    #[error("adding {dependent} -> {dependency} would create a dependency cycle")]
    CyclicDependency { dependent: BucketId, dependency: BucketId },

    #[error("{dependent} already depends on {dependency}")]
    DuplicateDependency { dependent: BucketId, dependency: BucketId },

    #[error("bucket {0} is not on the board")]
    UnknownBucket(BucketId),

    #[error("the intake bucket {0} cannot take part in dependencies or layering")]
    DumpBucket(BucketId),

    #[error("moved {applied} bucket(s), {} update(s) failed", .failures.len())]
    PartialMove {
        applied: usize,
        failures: Vec<(BucketId, StoreError)>,
    },

    #[error("removed {applied} dependency(ies), {} removal(s) failed", .failures.len())]
    PartialUnlink {
        applied: usize,
        failures: Vec<((BucketId, BucketId), StoreError)>,
    },

    #[error(transparent)]
    LayerOutOfRange(#[from] LayerOutOfRange),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure to encode or decode a [`BoardSnapshot`](crate::board::BoardSnapshot).
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid snapshot MessagePack: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

pub type BoardResult<T> = Result<T, BoardError>;

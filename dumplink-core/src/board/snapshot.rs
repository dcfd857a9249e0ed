//! Board Snapshot
//!
//! An immutable, self-contained copy of everything the graph core reads:
//! the buckets (with their overrides) and the dependencies of one project.
//! All read queries are answered from a snapshot, so every observer of the
//! same snapshot sees the same layering.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::graph::{Bucket, BucketId, Dependency};

/// Buckets and dependencies of one project at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub buckets: Vec<Bucket>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl BoardSnapshot {
    /// Create a snapshot from its parts.
    pub fn new(buckets: Vec<Bucket>, dependencies: Vec<Dependency>) -> Self {
        Self {
            buckets,
            dependencies,
        }
    }

    /// Parse a snapshot from the JSON shape served by the project API.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a MessagePack snapshot, as relayed over the real-time channel.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Encode as MessagePack with named fields.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Look up a bucket, intake included.
    pub fn bucket(&self, id: &BucketId) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| &bucket.id == id)
    }

    /// The project's intake bucket.
    pub fn dump_bucket(&self) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| bucket.dump)
    }

    /// Whether the edge `dependent -> dependency` exists.
    pub fn has_dependency(&self, dependent: &BucketId, dependency: &BucketId) -> bool {
        self.dependencies
            .iter()
            .any(|edge| edge.connects(dependent, dependency))
    }

    /// Buckets that carry a manual layer override.
    pub fn overridden(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().filter(|bucket| bucket.has_override())
    }
}

//! Graph Nodes
//!
//! This module defines the plain data records that live in the dependency
//! graph: buckets (nodes) and dependencies (edges).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a bucket.
///
/// Ids are opaque strings handed out by the persistence layer. The core never
/// interprets them beyond equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(String);

impl BucketId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BucketId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BucketId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A task group on the board.
///
/// Only `id`, `dump` and `layer` matter to the graph algorithms. The rest is
/// carried along so a snapshot can round-trip the records it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Unique identifier for this bucket.
    pub id: BucketId,

    /// Display name. Unnamed buckets are not placed on a layer unless they
    /// take part in a dependency.
    #[serde(default)]
    pub name: String,

    /// Whether this is the project's intake bucket. The intake bucket never
    /// takes part in dependency chains.
    #[serde(default)]
    pub dump: bool,

    /// Manual layer override. `None` means the layer is derived from the
    /// dependency chains.
    #[serde(default)]
    pub layer: Option<i64>,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub flagged: bool,
}

impl Bucket {
    /// Create a named, unlayered bucket.
    pub fn new(id: impl Into<BucketId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dump: false,
            layer: None,
            done: false,
            flagged: false,
        }
    }

    /// Create the intake bucket.
    pub fn dump(id: impl Into<BucketId>) -> Self {
        Self {
            dump: true,
            ..Self::new(id, "")
        }
    }

    /// Set a manual layer override.
    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Whether the bucket has a user-visible name.
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Whether the bucket's layer is manually overridden.
    pub fn has_override(&self) -> bool {
        self.layer.is_some()
    }
}

/// A dependency edge: `bucket_id` requires `dependency_id` to be finished
/// first.
///
/// Edges are identified by the ordered pair alone. `created_by` and
/// `created_at` are metadata and never affect the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// The dependent bucket.
    pub bucket_id: BucketId,

    /// The bucket it depends on.
    pub dependency_id: BucketId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Dependency {
    /// Create an edge without metadata.
    pub fn new(bucket_id: impl Into<BucketId>, dependency_id: impl Into<BucketId>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            dependency_id: dependency_id.into(),
            created_by: None,
            created_at: None,
        }
    }

    /// Attach the creating user.
    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    /// Whether this edge connects `dependent` to `dependency`.
    pub fn connects(&self, dependent: &BucketId, dependency: &BucketId) -> bool {
        &self.bucket_id == dependent && &self.dependency_id == dependency
    }

    /// Whether either end of the edge is `id`.
    pub fn touches(&self, id: &BucketId) -> bool {
        &self.bucket_id == id || &self.dependency_id == id
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.bucket_id == other.bucket_id && self.dependency_id == other.dependency_id
    }
}

impl Eq for Dependency {}

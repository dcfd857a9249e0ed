//! Board Store
//!
//! The store is the collaborator that owns the persisted board: it serves
//! snapshots and applies single-record mutations. In production it fronts
//! the project API; [`MemoryStore`] keeps everything in process.
//!
//! Every mutation touches one record. There are no multi-record
//! transactions, so a bulk operation can fail halfway.

use parking_lot::RwLock;
use tracing::trace;

use super::snapshot::BoardSnapshot;
use crate::error::StoreError;
use crate::graph::{BucketId, Dependency};

/// Persistence collaborator for one project's board.
///
/// Methods take `&self`: implementations synchronize internally, and a
/// successful mutation is visible in the next [`snapshot`](Self::snapshot).
pub trait BoardStore {
    /// Read the current buckets and dependencies.
    fn snapshot(&self) -> BoardSnapshot;

    /// Persist a bucket's layer override. `None` clears it.
    fn set_layer_override(&self, id: &BucketId, layer: Option<i64>) -> Result<(), StoreError>;

    /// Persist a new dependency. The store does not check for cycles.
    fn add_dependency(&self, dependency: Dependency) -> Result<(), StoreError>;

    /// Delete a dependency.
    fn remove_dependency(&self, dependent: &BucketId, dependency: &BucketId) -> Result<(), StoreError>;

    /// Clear every bucket's layer override.
    fn reset_all_layers(&self) -> Result<(), StoreError>;
}

/// An in-process store backed by a lock-protected snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<BoardSnapshot>,
}

impl MemoryStore {
    /// Create a store holding `snapshot`.
    pub fn new(snapshot: BoardSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Take the stored snapshot back out.
    pub fn into_snapshot(self) -> BoardSnapshot {
        self.state.into_inner()
    }
}

impl From<BoardSnapshot> for MemoryStore {
    fn from(snapshot: BoardSnapshot) -> Self {
        Self::new(snapshot)
    }
}

impl BoardStore for MemoryStore {
    fn snapshot(&self) -> BoardSnapshot {
        self.state.read().clone()
    }

    fn set_layer_override(&self, id: &BucketId, layer: Option<i64>) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let bucket = state
            .buckets
            .iter_mut()
            .find(|bucket| &bucket.id == id)
            .ok_or_else(|| StoreError::UnknownBucket(id.clone()))?;
        bucket.layer = layer;
        trace!(bucket = %id, ?layer, "stored layer override");
        Ok(())
    }

    fn add_dependency(&self, dependency: Dependency) -> Result<(), StoreError> {
        let mut state = self.state.write();
        for id in [&dependency.bucket_id, &dependency.dependency_id] {
            if !state.buckets.iter().any(|bucket| &bucket.id == id) {
                return Err(StoreError::UnknownBucket(id.clone()));
            }
        }
        if !state.dependencies.contains(&dependency) {
            state.dependencies.push(dependency);
        }
        Ok(())
    }

    fn remove_dependency(&self, dependent: &BucketId, dependency: &BucketId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let position = state
            .dependencies
            .iter()
            .position(|edge| edge.connects(dependent, dependency))
            .ok_or_else(|| StoreError::UnknownDependency {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
            })?;
        state.dependencies.remove(position);
        Ok(())
    }

    fn reset_all_layers(&self) -> Result<(), StoreError> {
        let mut state = self.state.write();
        for bucket in &mut state.buckets {
            bucket.layer = None;
        }
        Ok(())
    }
}

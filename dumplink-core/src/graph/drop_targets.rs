//! Drop-Target Eligibility
//!
//! While a bucket is dragged, each lane highlights whether the bucket may be
//! dropped there without putting it above something that depends on it. A
//! lane accepts the union of:
//!
//! - buckets nothing depends on (free movers)
//! - buckets whose deepest dependent already sits above the lane
//! - buckets already in the lane (a no-op drop)
//!
//! An index past the last lane is a new lane at the bottom, which accepts
//! every bucket: dropping there pushes the subgraph down.
//!
//! The per-bucket bound is computed once per layering in O(V + E), after
//! which every lane is answered from it.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::index::DependencyIndex;
use super::layers::{layers_for_index, LayerOptions, Layering};
use super::node::{Bucket, BucketId, Dependency};

/// Drop eligibility for every lane of one layering.
pub(crate) struct DropTargets<'l, 'a> {
    layering: &'l Layering,
    /// Non-intake buckets, in snapshot order.
    buckets: Vec<&'a BucketId>,
    /// Buckets nothing depends on.
    free: Vec<&'a BucketId>,
    /// Deepest lane among each bucket's placed dependents.
    deepest_dependent: HashMap<&'a BucketId, usize>,
}

impl<'l, 'a> DropTargets<'l, 'a> {
    pub(crate) fn new(index: &DependencyIndex<'a>, layering: &'l Layering) -> Self {
        let lanes = layering.lane_lookup();
        let mut buckets = Vec::with_capacity(index.bucket_count());
        let mut free = Vec::new();
        let mut deepest_dependent = HashMap::new();

        for bucket in index.buckets() {
            let id = &bucket.id;
            buckets.push(id);

            let dependents = index.dependents_of(id);
            if dependents.is_empty() {
                free.push(id);
                continue;
            }
            if let Some(deepest) = dependents.iter().filter_map(|dep| lanes.get(*dep)).max() {
                deepest_dependent.insert(id, *deepest);
            }
        }

        Self {
            layering,
            buckets,
            free,
            deepest_dependent,
        }
    }

    /// Buckets that may be dropped on `lane`.
    pub(crate) fn for_lane(&self, lane: usize) -> IndexSet<BucketId> {
        let Some(residents) = self.layering.lane(lane) else {
            return self.buckets.iter().map(|id| (*id).clone()).collect();
        };

        let mut accepted: IndexSet<BucketId> = self.free.iter().map(|id| (*id).clone()).collect();

        for id in &self.buckets {
            if let Some(deepest) = self.deepest_dependent.get(*id) {
                if *deepest < lane {
                    accepted.insert((*id).clone());
                }
            }
        }

        accepted.extend(residents.iter().cloned());
        accepted
    }
}

/// Buckets that may legally be dropped on lane `lane`.
pub fn acceptable_drops_for_layer(buckets: &[Bucket], edges: &[Dependency], lane: usize) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    let layering = layers_for_index(&index, LayerOptions::default());
    DropTargets::new(&index, &layering).for_lane(lane)
}

/// Drop eligibility for every existing lane, followed by the new lane below
/// the last one.
pub fn acceptable_drops_by_layer(buckets: &[Bucket], edges: &[Dependency]) -> Vec<IndexSet<BucketId>> {
    let index = DependencyIndex::new(buckets, edges);
    let layering = layers_for_index(&index, LayerOptions::default());
    let targets = DropTargets::new(&index, &layering);
    (0..=layering.len()).map(|lane| targets.for_lane(lane)).collect()
}

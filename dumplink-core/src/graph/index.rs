//! Dependency Index
//!
//! A read-only adjacency view over one snapshot of buckets and edges.
//!
//! The index keeps both forward (dependencies) and reverse (dependents)
//! edges so every algorithm can walk the graph in either direction in
//! O(1) per step. It is rebuilt from scratch for every computation; nothing
//! here is cached across snapshots.
//!
//! Building the index is where snapshot hygiene happens:
//!
//! - the intake bucket is left out entirely
//! - edges that reference an unknown (or intake) bucket are dropped
//! - duplicate edges and self-loops are dropped
//!
//! Iteration order follows the snapshot: buckets in the order given, and
//! each adjacency list in edge order.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::node::{Bucket, BucketId, Dependency};

type Adjacency<'a> = SmallVec<[&'a BucketId; 4]>;

/// Forward and reverse adjacency for the non-intake buckets of a snapshot.
#[derive(Debug)]
pub struct DependencyIndex<'a> {
    /// Non-intake buckets, in snapshot order.
    buckets: IndexMap<&'a BucketId, &'a Bucket>,

    /// For each bucket, the buckets it depends on.
    dependencies: IndexMap<&'a BucketId, Adjacency<'a>>,

    /// For each bucket, the buckets that depend on it.
    dependents: IndexMap<&'a BucketId, Adjacency<'a>>,

    /// Number of edges that survived filtering.
    edge_count: usize,
}

impl<'a> DependencyIndex<'a> {
    /// Build the index for one snapshot.
    pub fn new(buckets: &'a [Bucket], edges: &'a [Dependency]) -> Self {
        let buckets: IndexMap<_, _> = buckets
            .iter()
            .filter(|bucket| !bucket.dump)
            .map(|bucket| (&bucket.id, bucket))
            .collect();

        let mut dependencies: IndexMap<&BucketId, Adjacency<'_>> = IndexMap::new();
        let mut dependents: IndexMap<&BucketId, Adjacency<'_>> = IndexMap::new();
        let mut edge_count = 0;
        let mut stale = 0;

        for edge in edges {
            let (Some((dependent, _)), Some((dependency, _))) = (
                buckets.get_key_value(&edge.bucket_id),
                buckets.get_key_value(&edge.dependency_id),
            ) else {
                stale += 1;
                continue;
            };

            if dependent == dependency {
                warn!(bucket = %dependent, "ignoring self-dependency in snapshot");
                continue;
            }

            let forward = dependencies.entry(*dependent).or_default();
            if forward.contains(dependency) {
                continue;
            }
            forward.push(*dependency);
            dependents.entry(*dependency).or_default().push(*dependent);
            edge_count += 1;
        }

        if stale > 0 {
            debug!(stale, "skipped edges referencing unknown buckets");
        }

        Self {
            buckets,
            dependencies,
            dependents,
            edge_count,
        }
    }

    /// Whether `id` is a known, non-intake bucket.
    pub fn contains(&self, id: &BucketId) -> bool {
        self.buckets.contains_key(id)
    }

    /// Look up a non-intake bucket.
    pub fn bucket(&self, id: &BucketId) -> Option<&'a Bucket> {
        self.buckets.get(id).copied()
    }

    /// Iterate the non-intake buckets in snapshot order.
    pub fn buckets(&self) -> impl Iterator<Item = &'a Bucket> + '_ {
        self.buckets.values().copied()
    }

    /// Direct dependencies of `id`. Empty for unknown ids.
    pub fn dependencies_of(&self, id: &BucketId) -> &[&'a BucketId] {
        self.dependencies
            .get(id)
            .map(|adj| adj.as_slice())
            .unwrap_or(&[])
    }

    /// Direct dependents of `id`. Empty for unknown ids.
    pub fn dependents_of(&self, id: &BucketId) -> &[&'a BucketId] {
        self.dependents
            .get(id)
            .map(|adj| adj.as_slice())
            .unwrap_or(&[])
    }

    /// Whether anything depends on `id`.
    pub fn has_dependents(&self, id: &BucketId) -> bool {
        !self.dependents_of(id).is_empty()
    }

    /// Whether `id` depends on anything.
    pub fn has_dependencies(&self, id: &BucketId) -> bool {
        !self.dependencies_of(id).is_empty()
    }

    /// Get the number of edges in the index.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Get the number of non-intake buckets in the index.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&BucketId]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn forward_and_reverse_edges() {
        let buckets = vec![Bucket::new("a", "A"), Bucket::new("b", "B"), Bucket::new("c", "C")];
        let edges = vec![Dependency::new("a", "b"), Dependency::new("a", "c")];
        let index = DependencyIndex::new(&buckets, &edges);

        assert_eq!(ids(index.dependencies_of(&"a".into())), vec!["b", "c"]);
        assert_eq!(ids(index.dependents_of(&"c".into())), vec!["a"]);
        assert!(index.dependents_of(&"a".into()).is_empty());
        assert_eq!(index.edge_count(), 2);
    }

    #[test]
    fn intake_bucket_is_excluded() {
        let buckets = vec![Bucket::dump("dump"), Bucket::new("a", "A")];
        let edges = vec![Dependency::new("a", "dump")];
        let index = DependencyIndex::new(&buckets, &edges);

        assert!(!index.contains(&"dump".into()));
        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn stale_duplicate_and_self_edges_are_dropped() {
        let buckets = vec![Bucket::new("a", "A"), Bucket::new("b", "B")];
        let edges = vec![
            Dependency::new("a", "b"),
            Dependency::new("a", "b"),
            Dependency::new("a", "a"),
            Dependency::new("a", "ghost"),
            Dependency::new("ghost", "b"),
        ];
        let index = DependencyIndex::new(&buckets, &edges);

        assert_eq!(index.edge_count(), 1);
        assert_eq!(ids(index.dependents_of(&"b".into())), vec!["a"]);
    }

    #[test]
    fn unknown_ids_have_no_neighbours() {
        let buckets = vec![Bucket::new("a", "A")];
        let index = DependencyIndex::new(&buckets, &[]);

        assert!(index.dependencies_of(&"zzz".into()).is_empty());
        assert!(!index.has_dependents(&"zzz".into()));
        assert!(index.bucket(&"zzz".into()).is_none());
    }
}

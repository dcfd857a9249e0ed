//! Graph Primitives
//!
//! Direct-neighbour queries over a snapshot. All of these are pure and never
//! touch the edge list they are given.

use indexmap::IndexSet;

use super::index::DependencyIndex;
use super::node::{Bucket, BucketId, Dependency};

/// Direct dependencies of `id` (the buckets it requires).
///
/// Unknown ids and edges pointing at unknown buckets yield nothing.
pub fn dependencies_of(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    index
        .dependencies_of(id)
        .iter()
        .map(|dep| (*dep).clone())
        .collect()
}

/// Direct dependents of `id` (the buckets that require it).
pub fn dependents_of(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    index
        .dependents_of(id)
        .iter()
        .map(|dep| (*dep).clone())
        .collect()
}

/// Buckets nothing depends on, in snapshot order.
///
/// These are free to move to any layer: no other bucket's position is
/// constrained by them. The intake bucket is never included.
pub fn nodes_with_no_dependents<'a>(buckets: &'a [Bucket], edges: &'a [Dependency]) -> Vec<&'a Bucket> {
    let index = DependencyIndex::new(buckets, edges);
    index
        .buckets()
        .filter(|bucket| !index.has_dependents(&bucket.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> (Vec<Bucket>, Vec<Dependency>) {
        let buckets = vec![
            Bucket::dump("dump"),
            Bucket::new("a", "A"),
            Bucket::new("b", "B"),
            Bucket::new("c", "C"),
            Bucket::new("d", "D"),
        ];
        let edges = vec![
            Dependency::new("a", "b"),
            Dependency::new("a", "c"),
            Dependency::new("b", "d"),
            Dependency::new("c", "d"),
        ];
        (buckets, edges)
    }

    #[test]
    fn direct_dependencies() {
        let (buckets, edges) = board();
        let deps = dependencies_of(&buckets, &edges, &"a".into());
        assert_eq!(deps.iter().map(BucketId::as_str).collect::<Vec<_>>(), vec!["b", "c"]);
        assert!(dependencies_of(&buckets, &edges, &"d".into()).is_empty());
    }

    #[test]
    fn direct_dependents() {
        let (buckets, edges) = board();
        let deps = dependents_of(&buckets, &edges, &"d".into());
        assert_eq!(deps.iter().map(BucketId::as_str).collect::<Vec<_>>(), vec!["b", "c"]);
        assert!(dependents_of(&buckets, &edges, &"a".into()).is_empty());
    }

    #[test]
    fn roots_exclude_intake() {
        let (mut buckets, edges) = board();
        buckets.push(Bucket::new("e", "E"));
        let free: Vec<_> = nodes_with_no_dependents(&buckets, &edges)
            .into_iter()
            .map(|bucket| bucket.id.as_str())
            .collect();
        assert_eq!(free, vec!["a", "e"]);
    }

    #[test]
    fn missing_reference_is_absent() {
        let (buckets, mut edges) = board();
        edges.push(Dependency::new("a", "ghost"));
        let deps = dependencies_of(&buckets, &edges, &"a".into());
        assert!(!deps.contains(&BucketId::from("ghost")));
        assert!(dependents_of(&buckets, &edges, &"ghost".into()).is_empty());
    }
}

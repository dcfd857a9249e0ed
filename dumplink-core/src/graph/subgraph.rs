//! Subgraph Moves
//!
//! Moving a bucket to another layer moves its whole connected subgraph with
//! it: every bucket reachable by walking dependents upward and dependencies
//! downward, transitively. Every bucket in the subgraph is shifted by the
//! same delta, so the cluster keeps its internal shape.
//!
//! Planning a move is pure. The resulting [`OverrideUpdate`]s are applied by
//! the caller one bucket at a time, with no atomicity across the subgraph.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::index::DependencyIndex;
use super::layers::{
    effective_override, layer_in_range, layers_for_index, LayerOptions, Layering,
};
use super::node::{Bucket, BucketId, Dependency};
use crate::error::LayerOutOfRange;

/// A new value for one bucket's layer override. `None` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideUpdate {
    pub bucket_id: BucketId,
    pub layer: Option<i64>,
}

impl OverrideUpdate {
    /// Pin a bucket to `layer`.
    pub fn set(bucket_id: BucketId, layer: i64) -> Self {
        Self {
            bucket_id,
            layer: Some(layer),
        }
    }

    /// Return a bucket to its derived layer.
    pub fn clear(bucket_id: BucketId) -> Self {
        Self {
            bucket_id,
            layer: None,
        }
    }
}

fn walk<'a>(index: &DependencyIndex<'a>, start: &'a BucketId) -> IndexSet<&'a BucketId> {
    let mut visited: IndexSet<&BucketId> = IndexSet::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        // Dependents are explored before dependencies.
        for next in index
            .dependencies_of(current)
            .iter()
            .rev()
            .chain(index.dependents_of(current).iter().rev())
        {
            if !visited.contains(*next) {
                stack.push(*next);
            }
        }
    }

    visited
}

/// The connected subgraph of `id`: `id` itself, everything that depends on
/// it, and everything it depends on, transitively in both directions.
///
/// Unknown ids yield an empty set.
pub fn whole_subgraph(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    let Some(bucket) = index.bucket(id) else {
        return IndexSet::new();
    };
    walk(&index, &bucket.id).into_iter().cloned().collect()
}

/// The top-most dependents above `id`: walking dependents upward, the
/// buckets nothing depends on. A bucket without dependents is its own root.
pub fn roots_of_subgraph(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    let Some(bucket) = index.bucket(id) else {
        return IndexSet::new();
    };

    let mut roots = IndexSet::new();
    let mut seen: IndexSet<&BucketId> = IndexSet::new();
    let mut stack = vec![&bucket.id];

    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let dependents = index.dependents_of(current);
        if dependents.is_empty() {
            roots.insert(current.clone());
        }
        stack.extend(dependents.iter().rev().copied());
    }

    roots
}

/// Plan moving `root` and its whole subgraph so that `root` lands on
/// `target_layer`.
///
/// Every bucket in the subgraph gets an override of its current layer plus
/// `target_layer - layer(root)`. A bucket that is not placed on any lane
/// counts from its existing override, or from layer 0.
///
/// Fails without planning anything if some bucket would leave the range of
/// layers an override may hold.
pub fn plan_subgraph_move(
    buckets: &[Bucket],
    edges: &[Dependency],
    root: &BucketId,
    target_layer: i64,
) -> Result<Vec<OverrideUpdate>, LayerOutOfRange> {
    let index = DependencyIndex::new(buckets, edges);
    let layering = layers_for_index(&index, LayerOptions::default());
    plan_for_index(&index, &layering, root, target_layer)
}

pub(crate) fn plan_for_index(
    index: &DependencyIndex<'_>,
    layering: &Layering,
    root: &BucketId,
    target_layer: i64,
) -> Result<Vec<OverrideUpdate>, LayerOutOfRange> {
    let Some(bucket) = index.bucket(root) else {
        return Ok(Vec::new());
    };

    let lookup = layering.lane_lookup();
    let current = |bucket: &Bucket| {
        lookup
            .get(&bucket.id)
            .map(|lane| layering.base() + *lane as i64)
            .or_else(|| effective_override(bucket))
            .unwrap_or(0)
    };
    let out_of_range = |member: &Bucket| LayerOutOfRange {
        root: root.clone(),
        target_layer,
        bucket: member.id.clone(),
    };

    let diff = target_layer
        .checked_sub(current(bucket))
        .ok_or_else(|| out_of_range(bucket))?;

    walk(index, &bucket.id)
        .into_iter()
        .filter_map(|id| index.bucket(id))
        .map(|member| {
            current(member)
                .checked_add(diff)
                .filter(|layer| layer_in_range(*layer))
                .map(|layer| OverrideUpdate::set(member.id.clone(), layer))
                .ok_or_else(|| out_of_range(member))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::layers::{compute_layers, MAX_LAYER_OVERRIDE};

    fn ids(set: &IndexSet<BucketId>) -> Vec<&str> {
        set.iter().map(BucketId::as_str).collect()
    }

    /// Two components: a diamond a/b/c/d with a tail d -> e, and x -> y.
    fn board() -> (Vec<Bucket>, Vec<Dependency>) {
        let buckets = ["a", "b", "c", "d", "e", "x", "y"]
            .into_iter()
            .map(|id| Bucket::new(id, id.to_uppercase()))
            .collect();
        let edges = [
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
            ("d", "e"),
            ("x", "y"),
        ]
        .into_iter()
        .map(|(from, to)| Dependency::new(from, to))
        .collect();
        (buckets, edges)
    }

    #[test]
    fn subgraph_walks_both_directions() {
        let (buckets, edges) = board();
        let subgraph = whole_subgraph(&buckets, &edges, &"b".into());
        let mut members = ids(&subgraph);
        members.sort();
        assert_eq!(members, vec!["a", "b", "c", "d", "e"]);

        let subgraph = whole_subgraph(&buckets, &edges, &"y".into());
        let mut other = ids(&subgraph);
        other.sort();
        assert_eq!(other, vec!["x", "y"]);
    }

    #[test]
    fn subgraph_of_unknown_is_empty() {
        let (buckets, edges) = board();
        assert!(whole_subgraph(&buckets, &edges, &"ghost".into()).is_empty());
    }

    #[test]
    fn roots_are_found_upward() {
        let (buckets, edges) = board();
        let roots = roots_of_subgraph(&buckets, &edges, &"e".into());
        assert_eq!(ids(&roots), vec!["a"]);
        let roots = roots_of_subgraph(&buckets, &edges, &"a".into());
        assert_eq!(ids(&roots), vec!["a"]);
    }

    #[test]
    fn move_shifts_whole_component_by_the_same_delta() {
        let (buckets, edges) = board();
        let before = compute_layers(&buckets, &edges);
        assert_eq!(before.layer_of(&"b".into()), Some(1));

        let plan = plan_subgraph_move(&buckets, &edges, &"b".into(), 3).unwrap();
        assert_eq!(plan.len(), 5);
        for update in &plan {
            let old = before.layer_of(&update.bucket_id).unwrap();
            assert_eq!(update.layer, Some(old + 2), "bucket {}", update.bucket_id);
        }
        assert!(plan.iter().all(|update| update.bucket_id.as_str() != "x"));
    }

    #[test]
    fn applied_move_preserves_relative_order() {
        let (mut buckets, edges) = board();
        for update in plan_subgraph_move(&buckets, &edges, &"b".into(), 3).unwrap() {
            let bucket = buckets.iter_mut().find(|b| b.id == update.bucket_id).unwrap();
            bucket.layer = update.layer;
        }

        let after = compute_layers(&buckets, &edges);
        assert_eq!(after.layer_of(&"a".into()), Some(2));
        assert_eq!(after.layer_of(&"b".into()), Some(3));
        assert_eq!(after.layer_of(&"c".into()), Some(3));
        assert_eq!(after.layer_of(&"d".into()), Some(4));
        assert_eq!(after.layer_of(&"e".into()), Some(5));
        assert_eq!(after.layer_of(&"x".into()), Some(0));
    }

    #[test]
    fn move_up_can_go_negative() {
        let (buckets, edges) = board();
        let plan = plan_subgraph_move(&buckets, &edges, &"a".into(), -1).unwrap();
        let a = plan.iter().find(|u| u.bucket_id.as_str() == "a").unwrap();
        let e = plan.iter().find(|u| u.bucket_id.as_str() == "e").unwrap();
        assert_eq!(a.layer, Some(-1));
        assert_eq!(e.layer, Some(2));
    }

    #[test]
    fn unlayered_root_counts_from_its_override() {
        let buckets = vec![Bucket::new("a", "A").with_layer(4), Bucket::new("b", "B")];
        let plan = plan_subgraph_move(&buckets, &[], &"a".into(), 1);
        assert_eq!(plan, Ok(vec![OverrideUpdate::set("a".into(), 1)]));
    }

    #[test]
    fn move_past_the_layer_range_is_refused() {
        let buckets = vec![Bucket::new("a", "A"), Bucket::new("b", "B")];
        let edges = vec![Dependency::new("a", "b")];

        let err = plan_subgraph_move(&buckets, &edges, &"a".into(), i64::MAX).unwrap_err();
        assert_eq!(err.bucket.as_str(), "a");

        let err = plan_subgraph_move(&buckets, &edges, &"b".into(), i64::MIN).unwrap_err();
        assert_eq!(err.target_layer, i64::MIN);

        // a fits, but b would land one past the last layer.
        let err = plan_subgraph_move(&buckets, &edges, &"a".into(), MAX_LAYER_OVERRIDE).unwrap_err();
        assert_eq!(err.bucket.as_str(), "b");
        assert!(plan_subgraph_move(&buckets, &edges, &"a".into(), MAX_LAYER_OVERRIDE - 1).is_ok());
    }

    #[test]
    fn out_of_range_override_counts_from_the_clamp() {
        // Unnamed and unlinked, so the bucket is not on any lane.
        let buckets = vec![Bucket::new("u", "").with_layer(i64::MIN)];
        let plan = plan_subgraph_move(&buckets, &[], &"u".into(), 0).unwrap();
        assert_eq!(plan, vec![OverrideUpdate::set("u".into(), 0)]);
    }
}

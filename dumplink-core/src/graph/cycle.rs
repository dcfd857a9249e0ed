//! Cycle Detection
//!
//! The edge set must stay acyclic at all times: chain enumeration and
//! layering are only defined on a DAG. Every new edge is therefore checked
//! against the current edges before it is admitted.
//!
//! # Algorithm
//!
//! A proposed edge `dependent -> dependency` closes a cycle exactly when
//! `dependent` is already reachable from `dependency`. We run an iterative
//! depth-first search from `dependency`, keeping the current path on a
//! recursion stack:
//!
//! - reaching `dependent` means the candidate edge would close the loop
//! - meeting a node that is still on the stack means the snapshot already
//!   contains a cycle on that path, which is reported as well
//!
//! Each node is expanded at most once, so the check is O(V + E). The search
//! is iterative so deep chains cannot overflow the call stack.

use std::collections::{HashMap, HashSet};

use smallvec::SmallVec;

use super::index::DependencyIndex;
use super::node::{Bucket, BucketId, Dependency};

/// Forward adjacency over raw edges, reusable across many checks.
struct CycleCheck<'a> {
    adjacency: HashMap<&'a BucketId, SmallVec<[&'a BucketId; 4]>>,
}

impl<'a> CycleCheck<'a> {
    fn new(edges: &'a [Dependency]) -> Self {
        let mut adjacency: HashMap<&BucketId, SmallVec<[&BucketId; 4]>> = HashMap::new();
        for edge in edges {
            adjacency
                .entry(&edge.bucket_id)
                .or_default()
                .push(&edge.dependency_id);
        }
        Self { adjacency }
    }

    fn closes_cycle(&self, dependent: &BucketId, dependency: &BucketId) -> bool {
        if dependent == dependency {
            return true;
        }

        let mut visited: HashSet<&BucketId> = HashSet::new();
        let mut on_stack: HashSet<&BucketId> = HashSet::new();
        // (node, index of the next neighbour to visit)
        let mut stack: Vec<(&BucketId, usize)> = vec![(dependency, 0)];
        visited.insert(dependency);
        on_stack.insert(dependency);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let position = frame.1;
            frame.1 += 1;

            let next = self
                .adjacency
                .get(node)
                .and_then(|neighbours| neighbours.get(position))
                .copied();

            match next {
                Some(neighbour) => {
                    if neighbour == dependent || on_stack.contains(neighbour) {
                        return true;
                    }
                    if visited.insert(neighbour) {
                        on_stack.insert(neighbour);
                        stack.push((neighbour, 0));
                    }
                }
                None => {
                    on_stack.remove(node);
                    stack.pop();
                }
            }
        }

        false
    }
}

/// Whether adding `dependent -> dependency` to `edges` would create a cycle.
///
/// `edges` is never modified. A self-loop always reports `true`.
pub fn would_create_cycle(dependent: &BucketId, dependency: &BucketId, edges: &[Dependency]) -> bool {
    if dependent == dependency {
        return true;
    }
    CycleCheck::new(edges).closes_cycle(dependent, dependency)
}

/// Buckets that could legally take a new dependency on `dependency`.
///
/// Excludes the bucket itself, the intake bucket, buckets that already
/// depend on it directly, and buckets for which the edge would close a
/// cycle. Snapshot order is preserved.
pub fn link_candidates(buckets: &[Bucket], edges: &[Dependency], dependency: &BucketId) -> Vec<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    if !index.contains(dependency) {
        return Vec::new();
    }

    let check = CycleCheck::new(edges);
    let existing = index.dependents_of(dependency);

    index
        .buckets()
        .map(|bucket| &bucket.id)
        .filter(|id| *id != dependency)
        .filter(|id| !existing.contains(id))
        .filter(|id| !check.closes_cycle(id, dependency))
        .cloned()
        .collect()
}

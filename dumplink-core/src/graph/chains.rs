//! Chain Enumeration
//!
//! A chain is a directed path `[n0, n1, ..., nk]` where each `n_i` depends on
//! `n_{i+1}` and `nk` depends on nothing. Chains drive both the layering and
//! the connector lines drawn between buckets.
//!
//! # Algorithm
//!
//! The chains starting at a bucket are the bucket itself if it has no
//! dependencies, otherwise the bucket prepended to every chain of every
//! dependency. Computed naively this explodes on diamond-shaped graphs, where
//! a shared dependency is re-expanded once per path reaching it.
//!
//! We instead run the recursion once per bucket as dynamic programming over
//! the DAG. Chain suffixes are stored as shared linked lists, so prepending a
//! bucket to a dependency's chains allocates one link per chain instead of
//! copying every suffix. The traversal is an explicit post-order walk and
//! cannot overflow the call stack on long chains.
//!
//! A chain is maximal (not a suffix of a longer chain) exactly when its first
//! bucket has no dependents, so the maximal chains are the chains of the
//! roots. Chains of length 1 carry no dependency and are dropped.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::{debug, warn};

use super::index::DependencyIndex;
use super::node::{Bucket, BucketId, Dependency};

/// An ordered path of bucket ids, dependent first.
pub type Chain = Vec<BucketId>;

/// One link of a shared chain suffix.
#[derive(Debug)]
struct Link<'a> {
    id: &'a BucketId,
    next: Option<Rc<Link<'a>>>,
}

impl<'a> Link<'a> {
    fn to_chain(&self) -> Chain {
        let mut chain = vec![self.id.clone()];
        let mut cursor = self.next.as_deref();
        while let Some(link) = cursor {
            chain.push(link.id.clone());
            cursor = link.next.as_deref();
        }
        chain
    }
}

type Suffixes<'a> = Rc<Vec<Rc<Link<'a>>>>;

/// Memoized chain suffixes for every bucket visited so far.
pub(crate) struct ChainEnumerator<'i, 'a> {
    index: &'i DependencyIndex<'a>,
    memo: HashMap<&'a BucketId, Suffixes<'a>>,
}

impl<'i, 'a> ChainEnumerator<'i, 'a> {
    pub(crate) fn new(index: &'i DependencyIndex<'a>) -> Self {
        Self {
            index,
            memo: HashMap::new(),
        }
    }

    /// All chains starting at `start`, as shared suffixes.
    fn suffixes(&mut self, start: &'a BucketId) -> Suffixes<'a> {
        let mut visiting: HashSet<&BucketId> = HashSet::new();
        let mut stack: Vec<(&'a BucketId, bool)> = vec![(start, false)];

        while let Some((node, expanded)) = stack.pop() {
            if self.memo.contains_key(node) {
                continue;
            }

            if !expanded {
                if !visiting.insert(node) {
                    continue;
                }
                stack.push((node, true));
                for dep in self.index.dependencies_of(node).iter().rev() {
                    if visiting.contains(*dep) {
                        warn!(from = %node, to = %dep, "dependency cycle in snapshot, skipping edge");
                    } else if !self.memo.contains_key(*dep) {
                        stack.push((*dep, false));
                    }
                }
                continue;
            }

            let mut links = Vec::new();
            for dep in self.index.dependencies_of(node) {
                // A dependency without a memo entry is the back edge of a cycle.
                let Some(tails) = self.memo.get(*dep) else {
                    continue;
                };
                for tail in tails.iter() {
                    links.push(Rc::new(Link {
                        id: node,
                        next: Some(Rc::clone(tail)),
                    }));
                }
            }
            if links.is_empty() {
                links.push(Rc::new(Link { id: node, next: None }));
            }

            visiting.remove(node);
            self.memo.insert(node, Rc::new(links));
        }

        self.memo
            .get(start)
            .cloned()
            .unwrap_or_else(|| Rc::new(Vec::new()))
    }

    /// Materialized chains starting at `start`.
    pub(crate) fn chains_from(&mut self, start: &'a BucketId) -> Vec<Chain> {
        self.suffixes(start).iter().map(|link| link.to_chain()).collect()
    }

    /// All maximal chains of length two or more, root by root in snapshot
    /// order.
    pub(crate) fn maximal_chains(&mut self) -> Vec<Chain> {
        let index = self.index;
        let mut chains = Vec::new();
        for bucket in index.buckets() {
            if index.has_dependents(&bucket.id) || !index.has_dependencies(&bucket.id) {
                continue;
            }
            chains.extend(self.chains_from(&bucket.id));
        }
        chains
    }
}

/// All maximal dependency chains of the board.
///
/// Sub-chains that are a suffix of a longer chain and chains of a single
/// bucket are not reported. An edge-free board yields no chains.
pub fn all_chains(buckets: &[Bucket], edges: &[Dependency]) -> Vec<Chain> {
    let index = DependencyIndex::new(buckets, edges);
    let chains = ChainEnumerator::new(&index).maximal_chains();
    debug!(
        buckets = index.bucket_count(),
        edges = index.edge_count(),
        chains = chains.len(),
        "enumerated dependency chains"
    );
    chains
}

/// Every chain starting at `id`, including the single-bucket chain when `id`
/// depends on nothing. Unknown ids yield no chains.
pub fn chains_for(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> Vec<Chain> {
    let index = DependencyIndex::new(buckets, edges);
    let Some(bucket) = index.bucket(id) else {
        return Vec::new();
    };
    ChainEnumerator::new(&index).chains_from(&bucket.id)
}

/// `id` followed by everything it depends on, directly or transitively, in
/// depth-first order. Unknown ids yield an empty set.
pub fn transitive_dependencies(buckets: &[Bucket], edges: &[Dependency], id: &BucketId) -> IndexSet<BucketId> {
    let index = DependencyIndex::new(buckets, edges);
    let mut seen: IndexSet<&BucketId> = IndexSet::new();
    let Some(bucket) = index.bucket(id) else {
        return IndexSet::new();
    };

    let mut stack = vec![&bucket.id];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        for dep in index.dependencies_of(current).iter().rev() {
            if !seen.contains(*dep) {
                stack.push(*dep);
            }
        }
    }

    seen.into_iter().cloned().collect()
}

/// Unique adjacent pairs across all chains, in first-seen order.
///
/// Used for drawing one connector per dependency.
pub fn all_pairs(chains: &[Chain]) -> Vec<(BucketId, BucketId)> {
    let mut pairs: IndexSet<(&BucketId, &BucketId)> = IndexSet::new();
    for chain in chains {
        for window in chain.windows(2) {
            pairs.insert((&window[0], &window[1]));
        }
    }
    pairs
        .into_iter()
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect()
}

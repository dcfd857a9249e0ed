//! Dependency Graph
//!
//! This module implements the dependency graph between buckets and the
//! layering derived from it.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are buckets (the intake bucket is never part of the graph)
//! - Edges are dependencies: an edge `(A, B)` means A requires B to be
//!   finished first
//!
//! From the graph we derive the chains (maximal dependency paths), the
//! layers used to render the board in build order, and the lanes a dragged
//! bucket may be dropped on.
//!
//! # Design Decisions
//!
//! 1. Every algorithm is a free function over an explicit snapshot
//!    (`&[Bucket]`, `&[Dependency]`). There is no graph object with hidden
//!    state, so each function can be tested in isolation.
//!
//! 2. Layering is recomputed from scratch on every call. The only persisted
//!    input besides the edges is each bucket's manual layer override.
//!
//! 3. Stale references are tolerated: an edge that mentions an unknown
//!    bucket is ignored rather than rejected, because a snapshot may be
//!    briefly inconsistent during real-time sync.
//!
//! 4. Cycle safety is a predicate, not an enforcement point. Callers must
//!    check [`would_create_cycle`] before admitting an edge.

mod chains;
mod cycle;
mod drop_targets;
mod index;
mod layers;
mod node;
mod primitives;
mod subgraph;

pub use chains::{all_chains, all_pairs, chains_for, transitive_dependencies, Chain};
pub use cycle::{link_candidates, would_create_cycle};
pub use drop_targets::{acceptable_drops_by_layer, acceptable_drops_for_layer};
pub use index::DependencyIndex;
pub use layers::{
    compute_layers, compute_layers_with, layer_in_range, override_conflicts, LayerConflict,
    LayerOptions, Layering, MAX_LAYER_OVERRIDE,
};
pub use node::{Bucket, BucketId, Dependency};
pub use primitives::{dependencies_of, dependents_of, nodes_with_no_dependents};
pub use subgraph::{plan_subgraph_move, roots_of_subgraph, whole_subgraph, OverrideUpdate};

pub(crate) use drop_targets::DropTargets;
pub(crate) use layers::{conflicts_for_index, layers_for_index};
pub(crate) use subgraph::plan_for_index;

//! Board Policy
//!
//! Product decisions the graph core leaves to its caller, gathered in one
//! serde-loadable struct. Missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::graph::LayerOptions;

/// How the board reacts to edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardPolicy {
    /// After removing `A -> B`, clear B's override if nothing depends on B
    /// any more.
    pub clear_orphaned_overrides: bool,

    /// After linking two buckets, clear the overrides of the merged
    /// subgraph so it falls back to its derived layers.
    pub reset_subgraph_on_link: bool,

    /// Place named buckets without dependencies on layer 0.
    pub place_isolated_buckets: bool,

    /// Log a warning for every override that contradicts dependency order
    /// when the layering is read through the board.
    pub warn_on_conflicts: bool,
}

impl Default for BoardPolicy {
    fn default() -> Self {
        Self {
            clear_orphaned_overrides: true,
            reset_subgraph_on_link: true,
            place_isolated_buckets: true,
            warn_on_conflicts: true,
        }
    }
}

impl BoardPolicy {
    /// Parse a policy from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Options for the layer assigner.
    pub fn layer_options(&self) -> LayerOptions {
        LayerOptions {
            place_isolated: self.place_isolated_buckets,
        }
    }
}

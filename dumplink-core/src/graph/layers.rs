//! Layer Assignment
//!
//! Turns the dependency chains into discrete layers (lanes) for rendering the
//! board in build order.
//!
//! # Algorithm
//!
//! 1. Enumerate the maximal chains.
//! 2. A bucket's natural layer is its largest position across all chains,
//!    counted from the chain start. Dependents start at layer 0, and each
//!    bucket sits below everything that depends on it.
//! 3. A manual override replaces the natural layer. Overrides are local to
//!    their bucket: they do not push dependencies further down.
//! 4. Named buckets outside every chain land on layer 0 (or their
//!    override) so they are rendered somewhere.
//! 5. Buckets are grouped by layer into contiguous lanes from the smallest
//!    to the largest layer present, with empty lanes filling any gap.
//!
//! A board without chains has no lanes at all, whatever overrides remain.
//! Callers treat that as "everything unlayered".

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::chains::ChainEnumerator;
use super::index::DependencyIndex;
use super::node::{Bucket, BucketId, Dependency};

/// Largest override magnitude the layering honours. Overrides beyond it are
/// clamped so the lane span stays bounded by the board size.
pub const MAX_LAYER_OVERRIDE: i64 = 10_000;

/// Whether `layer` is a layer an override may hold.
pub fn layer_in_range(layer: i64) -> bool {
    (-MAX_LAYER_OVERRIDE..=MAX_LAYER_OVERRIDE).contains(&layer)
}

/// The override of `bucket`, clamped into the supported range.
pub(crate) fn effective_override(bucket: &Bucket) -> Option<i64> {
    let layer = bucket.layer?;
    if !layer_in_range(layer) {
        warn!(bucket = %bucket.id, layer, "clamping out-of-range layer override");
    }
    Some(layer.clamp(-MAX_LAYER_OVERRIDE, MAX_LAYER_OVERRIDE))
}

/// Knobs for [`compute_layers_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerOptions {
    /// Place named buckets that take part in no chain on layer 0.
    pub place_isolated: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self { place_isolated: true }
    }
}

/// Buckets grouped into contiguous lanes.
///
/// Lane `i` holds the buckets on layer `base + i`. The base is 0 unless an
/// override moved the shallowest bucket elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layering {
    base: i64,
    lanes: Vec<Vec<BucketId>>,
}

impl Layering {
    /// Layer number of lane 0.
    pub fn base(&self) -> i64 {
        self.base
    }

    /// The lanes, shallowest first.
    pub fn lanes(&self) -> &[Vec<BucketId>] {
        &self.lanes
    }

    /// Buckets in one lane.
    pub fn lane(&self, index: usize) -> Option<&[BucketId]> {
        self.lanes.get(index).map(Vec::as_slice)
    }

    /// Number of lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether there are no lanes, i.e. the board is unlayered.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Lane index holding `id`.
    pub fn lane_of(&self, id: &BucketId) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.contains(id))
    }

    /// Layer number of lane `lane`. Lanes past the last one continue the
    /// numbering, so the new-lane drop target maps to `base + len`.
    pub fn layer_at(&self, lane: usize) -> Option<i64> {
        i64::try_from(lane).ok().and_then(|lane| self.base.checked_add(lane))
    }

    /// Layer number of `id`.
    pub fn layer_of(&self, id: &BucketId) -> Option<i64> {
        self.lane_of(id).map(|lane| self.base + lane as i64)
    }

    /// Lane index for every placed bucket.
    pub fn lane_lookup(&self) -> HashMap<&BucketId, usize> {
        self.lanes
            .iter()
            .enumerate()
            .flat_map(|(lane, ids)| ids.iter().map(move |id| (id, lane)))
            .collect()
    }

    /// Consume into the raw lane list.
    pub fn into_lanes(self) -> Vec<Vec<BucketId>> {
        self.lanes
    }

    fn from_layers(layers: BTreeMap<i64, Vec<BucketId>>) -> Self {
        let (Some(&min), Some(&max)) = (layers.keys().next(), layers.keys().next_back()) else {
            return Self::default();
        };

        let mut layers = layers;
        let lanes = (min..=max)
            .map(|layer| layers.remove(&layer).unwrap_or_default())
            .collect();

        Self { base: min, lanes }
    }
}

/// A dependency whose endpoints are layered against dependency order.
///
/// The dependent should sit on a strictly smaller layer than its
/// dependency. Derived layers always satisfy this; only manual overrides
/// can break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConflict {
    pub dependent: BucketId,
    pub dependency: BucketId,
    pub dependent_layer: i64,
    pub dependency_layer: i64,
}

/// Compute the lanes of the board with default options.
pub fn compute_layers(buckets: &[Bucket], edges: &[Dependency]) -> Layering {
    compute_layers_with(buckets, edges, LayerOptions::default())
}

/// Compute the lanes of the board.
pub fn compute_layers_with(buckets: &[Bucket], edges: &[Dependency], options: LayerOptions) -> Layering {
    let index = DependencyIndex::new(buckets, edges);
    layers_for_index(&index, options)
}

pub(crate) fn layers_for_index(index: &DependencyIndex<'_>, options: LayerOptions) -> Layering {
    let chains = ChainEnumerator::new(index).maximal_chains();
    if chains.is_empty() {
        return Layering::default();
    }

    // Largest position per bucket, in order of first appearance.
    let mut depth: IndexMap<&BucketId, usize> = IndexMap::new();
    for chain in &chains {
        for (position, id) in chain.iter().enumerate() {
            let entry = depth.entry(id).or_insert(position);
            *entry = (*entry).max(position);
        }
    }

    let mut layers: BTreeMap<i64, Vec<BucketId>> = BTreeMap::new();
    let mut overridden = 0;

    for (id, position) in &depth {
        let Some(bucket) = index.bucket(id) else {
            continue;
        };
        let layer = match effective_override(bucket) {
            Some(layer) => {
                overridden += 1;
                layer
            }
            None => *position as i64,
        };
        layers.entry(layer).or_default().push((*id).clone());
    }

    if options.place_isolated {
        for bucket in index.buckets() {
            if !bucket.is_named() || depth.contains_key(&bucket.id) {
                continue;
            }
            let layer = effective_override(bucket).unwrap_or(0);
            layers.entry(layer).or_default().push(bucket.id.clone());
        }
    }

    let layering = Layering::from_layers(layers);
    debug!(
        chains = chains.len(),
        lanes = layering.len(),
        base = layering.base(),
        overridden,
        "computed layers"
    );
    layering
}

/// Every dependency whose layers contradict dependency order.
///
/// Overrides are honoured as given; this query lets callers surface the
/// resulting inconsistencies instead.
pub fn override_conflicts(buckets: &[Bucket], edges: &[Dependency]) -> Vec<LayerConflict> {
    let index = DependencyIndex::new(buckets, edges);
    let layering = layers_for_index(&index, LayerOptions::default());
    conflicts_for_index(&index, &layering)
}

pub(crate) fn conflicts_for_index(index: &DependencyIndex<'_>, layering: &Layering) -> Vec<LayerConflict> {
    let lookup = layering.lane_lookup();
    let layer = |id: &BucketId| lookup.get(id).map(|lane| layering.base() + *lane as i64);

    let mut conflicts = Vec::new();
    for bucket in index.buckets() {
        let Some(dependent_layer) = layer(&bucket.id) else {
            continue;
        };
        for dependency in index.dependencies_of(&bucket.id) {
            let Some(dependency_layer) = layer(*dependency) else {
                continue;
            };
            if dependent_layer >= dependency_layer {
                conflicts.push(LayerConflict {
                    dependent: bucket.id.clone(),
                    dependency: (*dependency).clone(),
                    dependent_layer,
                    dependency_layer,
                });
            }
        }
    }
    conflicts
}

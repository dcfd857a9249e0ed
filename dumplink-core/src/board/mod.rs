//! Board Commands
//!
//! [`Board`] ties the pure graph core to a [`BoardStore`]. Read queries take
//! a fresh snapshot from the store on every call and recompute from
//! scratch; nothing is cached between calls. Commands validate against the
//! same fresh snapshot and then apply single-record updates through the
//! store.
//!
//! # Design Decisions
//!
//! 1. Validation happens here, not in the store. The store accepts any
//!    well-formed edge, so [`Board::link`] is the place where self links,
//!    duplicates and cycles are refused.
//!
//! 2. Multi-bucket updates are not atomic. A subgraph move applies its
//!    overrides one by one and reports the ones that failed; the buckets
//!    already moved stay moved.

mod policy;
mod snapshot;
mod store;

pub use policy::BoardPolicy;
pub use snapshot::BoardSnapshot;
pub use store::{BoardStore, MemoryStore};

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::error::{BoardError, BoardResult};
use crate::graph::{
    all_chains, all_pairs, conflicts_for_index, layers_for_index, link_candidates, plan_for_index,
    whole_subgraph, would_create_cycle, Bucket, BucketId, Chain, Dependency, DependencyIndex,
    DropTargets, LayerConflict, Layering, OverrideUpdate,
};

/// A project board backed by a store.
pub struct Board<S> {
    store: S,
    policy: BoardPolicy,
}

/// Find `id` in `snapshot`, refusing unknown buckets and the intake bucket.
fn resolve<'s>(snapshot: &'s BoardSnapshot, id: &BucketId) -> BoardResult<&'s Bucket> {
    match snapshot.bucket(id) {
        None => Err(BoardError::UnknownBucket(id.clone())),
        Some(bucket) if bucket.dump => Err(BoardError::DumpBucket(id.clone())),
        Some(bucket) => Ok(bucket),
    }
}

impl<S: BoardStore> Board<S> {
    /// Create a board with the default policy.
    pub fn new(store: S) -> Self {
        Self::with_policy(store, BoardPolicy::default())
    }

    pub fn with_policy(store: S, policy: BoardPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &BoardPolicy {
        &self.policy
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// A fresh snapshot from the store.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.store.snapshot()
    }

    fn layering_of(&self, index: &DependencyIndex<'_>) -> Layering {
        let layering = layers_for_index(index, self.policy.layer_options());
        if self.policy.warn_on_conflicts {
            for conflict in conflicts_for_index(index, &layering) {
                warn!(
                    dependent = %conflict.dependent,
                    dependency = %conflict.dependency,
                    dependent_layer = conflict.dependent_layer,
                    dependency_layer = conflict.dependency_layer,
                    "layer override contradicts dependency order"
                );
            }
        }
        layering
    }

    // ---- read queries ----

    /// The current layering.
    pub fn layering(&self) -> Layering {
        let snapshot = self.store.snapshot();
        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        self.layering_of(&index)
    }

    /// All maximal dependency chains.
    pub fn chains(&self) -> Vec<Chain> {
        let snapshot = self.store.snapshot();
        all_chains(&snapshot.buckets, &snapshot.dependencies)
    }

    /// Unique adjacent pairs over all chains.
    pub fn pairs(&self) -> Vec<(BucketId, BucketId)> {
        all_pairs(&self.chains())
    }

    /// Buckets that may be dropped on `lane`. A lane past the last one is a
    /// new lane and accepts every bucket.
    pub fn drop_targets(&self, lane: usize) -> IndexSet<BucketId> {
        let snapshot = self.store.snapshot();
        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        let layering = self.layering_of(&index);
        DropTargets::new(&index, &layering).for_lane(lane)
    }

    /// Drop targets for every lane plus the new lane after the last one.
    pub fn drop_targets_by_lane(&self) -> Vec<IndexSet<BucketId>> {
        let snapshot = self.store.snapshot();
        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        let layering = self.layering_of(&index);
        let targets = DropTargets::new(&index, &layering);
        (0..=layering.len()).map(|lane| targets.for_lane(lane)).collect()
    }

    /// Dependencies whose endpoints' layers contradict the edge direction.
    pub fn conflicts(&self) -> Vec<LayerConflict> {
        let snapshot = self.store.snapshot();
        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        let layering = layers_for_index(&index, self.policy.layer_options());
        conflicts_for_index(&index, &layering)
    }

    /// Buckets that may take a new dependency on `dependency`.
    pub fn link_candidates(&self, dependency: &BucketId) -> Vec<BucketId> {
        let snapshot = self.store.snapshot();
        link_candidates(&snapshot.buckets, &snapshot.dependencies, dependency)
    }

    // ---- commands ----

    /// Add a dependency after checking it against the current snapshot.
    ///
    /// With `reset_subgraph_on_link`, the overrides of the merged subgraph
    /// are cleared afterwards. Returns the overrides that were cleared.
    pub fn link(&self, dependency: Dependency) -> BoardResult<Vec<OverrideUpdate>> {
        let snapshot = self.store.snapshot();
        let dependent_id = &dependency.bucket_id;
        let dependency_id = &dependency.dependency_id;

        resolve(&snapshot, dependent_id)?;
        resolve(&snapshot, dependency_id)?;

        if dependent_id == dependency_id {
            return Err(BoardError::SelfDependency(dependent_id.clone()));
        }
        if snapshot.has_dependency(dependent_id, dependency_id) {
            return Err(BoardError::DuplicateDependency {
                dependent: dependent_id.clone(),
                dependency: dependency_id.clone(),
            });
        }
        if would_create_cycle(dependent_id, dependency_id, &snapshot.dependencies) {
            return Err(BoardError::CyclicDependency {
                dependent: dependent_id.clone(),
                dependency: dependency_id.clone(),
            });
        }

        let (dependent_id, dependency_id) = (dependent_id.clone(), dependency_id.clone());
        self.store.add_dependency(dependency)?;
        info!(dependent = %dependent_id, dependency = %dependency_id, "dependency added");

        if !self.policy.reset_subgraph_on_link {
            return Ok(Vec::new());
        }

        let snapshot = self.store.snapshot();
        let mut cleared = Vec::new();
        for id in whole_subgraph(&snapshot.buckets, &snapshot.dependencies, &dependent_id) {
            if snapshot.bucket(&id).is_some_and(Bucket::has_override) {
                self.store.set_layer_override(&id, None)?;
                cleared.push(OverrideUpdate::clear(id));
            }
        }
        debug!(cleared = cleared.len(), "reset overrides of linked subgraph");
        Ok(cleared)
    }

    /// Remove the dependency `dependent -> dependency`.
    ///
    /// With `clear_orphaned_overrides`, a dependency left without any
    /// dependent loses its override. Returns the overrides that were cleared.
    pub fn unlink(&self, dependent: &BucketId, dependency: &BucketId) -> BoardResult<Vec<OverrideUpdate>> {
        self.store.remove_dependency(dependent, dependency)?;
        info!(dependent = %dependent, dependency = %dependency, "dependency removed");

        if !self.policy.clear_orphaned_overrides {
            return Ok(Vec::new());
        }

        let snapshot = self.store.snapshot();
        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        match index.bucket(dependency) {
            Some(bucket) if bucket.has_override() && !index.has_dependents(dependency) => {
                self.store.set_layer_override(dependency, None)?;
                debug!(bucket = %dependency, "cleared override of orphaned dependency");
                Ok(vec![OverrideUpdate::clear(dependency.clone())])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Remove every dependency, one at a time, then reset all layers.
    ///
    /// Removals are independent. Failed ones are reported through
    /// [`BoardError::PartialUnlink`] after the layers have been reset.
    /// Returns the number of dependencies removed.
    pub fn unlink_all(&self) -> BoardResult<usize> {
        let snapshot = self.store.snapshot();

        let mut applied = 0;
        let mut failures = Vec::new();
        for edge in &snapshot.dependencies {
            match self.store.remove_dependency(&edge.bucket_id, &edge.dependency_id) {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(
                        dependent = %edge.bucket_id,
                        dependency = %edge.dependency_id,
                        error = %err,
                        "failed to remove dependency"
                    );
                    failures.push(((edge.bucket_id.clone(), edge.dependency_id.clone()), err));
                }
            }
        }

        self.reset_all_layers()?;

        if !failures.is_empty() {
            return Err(BoardError::PartialUnlink { applied, failures });
        }
        info!(removed = applied, "removed all dependencies");
        Ok(applied)
    }

    /// Move `root` to `target_layer`, shifting its whole subgraph with it.
    ///
    /// Updates are applied one bucket at a time. If any fail, the rest are
    /// still attempted and [`BoardError::PartialMove`] lists the failures.
    /// A move that would leave the supported layer range is refused before
    /// anything is written.
    pub fn move_subgraph(&self, root: &BucketId, target_layer: i64) -> BoardResult<Vec<OverrideUpdate>> {
        let snapshot = self.store.snapshot();
        resolve(&snapshot, root)?;

        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        let layering = layers_for_index(&index, self.policy.layer_options());
        self.apply_move(&index, &layering, root, target_layer)
    }

    /// Move `root` onto lane `lane` of the current layering, as a drop on
    /// that lane does. A lane past the last one is the new lane.
    pub fn move_subgraph_to_lane(&self, root: &BucketId, lane: usize) -> BoardResult<Vec<OverrideUpdate>> {
        let snapshot = self.store.snapshot();
        resolve(&snapshot, root)?;

        let index = DependencyIndex::new(&snapshot.buckets, &snapshot.dependencies);
        let layering = layers_for_index(&index, self.policy.layer_options());
        let target_layer = layering.layer_at(lane).unwrap_or(i64::MAX);
        self.apply_move(&index, &layering, root, target_layer)
    }

    fn apply_move(
        &self,
        index: &DependencyIndex<'_>,
        layering: &Layering,
        root: &BucketId,
        target_layer: i64,
    ) -> BoardResult<Vec<OverrideUpdate>> {
        let updates = plan_for_index(index, layering, root, target_layer)?;

        let mut failures = Vec::new();
        for update in &updates {
            if let Err(err) = self.store.set_layer_override(&update.bucket_id, update.layer) {
                warn!(bucket = %update.bucket_id, error = %err, "failed to move bucket");
                failures.push((update.bucket_id.clone(), err));
            }
        }

        if !failures.is_empty() {
            return Err(BoardError::PartialMove {
                applied: updates.len() - failures.len(),
                failures,
            });
        }

        info!(root = %root, target_layer, moved = updates.len(), "moved subgraph");
        Ok(updates)
    }

    /// Return one bucket to its derived layer.
    pub fn reset_layer(&self, id: &BucketId) -> BoardResult<()> {
        let snapshot = self.store.snapshot();
        resolve(&snapshot, id)?;
        self.store.set_layer_override(id, None)?;
        Ok(())
    }

    /// Return every bucket to its derived layer.
    pub fn reset_all_layers(&self) -> BoardResult<()> {
        self.store.reset_all_layers()?;
        info!("reset all layer overrides");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MAX_LAYER_OVERRIDE;

    fn names(ids: &[BucketId]) -> Vec<&str> {
        ids.iter().map(BucketId::as_str).collect()
    }

    fn board() -> Board<MemoryStore> {
        let snapshot = BoardSnapshot::new(
            vec![
                Bucket::dump("dump"),
                Bucket::new("a", "A"),
                Bucket::new("b", "B"),
                Bucket::new("c", "C"),
            ],
            vec![Dependency::new("a", "b")],
        );
        Board::new(MemoryStore::new(snapshot))
    }

    #[test]
    fn link_refuses_invalid_edges() {
        let board = board();
        assert!(matches!(
            board.link(Dependency::new("a", "a")),
            Err(BoardError::SelfDependency(_))
        ));
        assert!(matches!(
            board.link(Dependency::new("a", "b")),
            Err(BoardError::DuplicateDependency { .. })
        ));
        assert!(matches!(
            board.link(Dependency::new("b", "a")),
            Err(BoardError::CyclicDependency { .. })
        ));
        assert!(matches!(
            board.link(Dependency::new("a", "dump")),
            Err(BoardError::DumpBucket(_))
        ));
        assert!(matches!(
            board.link(Dependency::new("a", "nope")),
            Err(BoardError::UnknownBucket(_))
        ));
        assert_eq!(board.snapshot().dependencies.len(), 1);
    }

    #[test]
    fn link_clears_overrides_of_merged_subgraph() {
        let board = board();
        board.store().set_layer_override(&"b".into(), Some(4)).unwrap();
        board.store().set_layer_override(&"c".into(), Some(7)).unwrap();

        let cleared = board.link(Dependency::new("b", "c").created_by("ana")).unwrap();
        let mut ids: Vec<_> = cleared.iter().map(|u| u.bucket_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["b", "c"]);
        assert_eq!(board.snapshot().overridden().count(), 0);
        let layering = board.layering();
        let lanes: Vec<_> = layering.lanes().iter().map(|lane| names(lane)).collect();
        assert_eq!(lanes, [["a"], ["b"], ["c"]]);
    }

    #[test]
    fn link_keeps_overrides_when_disabled() {
        let policy = BoardPolicy {
            reset_subgraph_on_link: false,
            ..BoardPolicy::default()
        };
        let board = Board::with_policy(MemoryStore::new(board().snapshot()), policy);
        board.store().set_layer_override(&"c".into(), Some(7)).unwrap();
        assert!(board.link(Dependency::new("b", "c")).unwrap().is_empty());
        assert_eq!(board.snapshot().overridden().count(), 1);
    }

    #[test]
    fn unlink_clears_orphaned_override() {
        let board = board();
        board.store().set_layer_override(&"b".into(), Some(2)).unwrap();

        let cleared = board.unlink(&"a".into(), &"b".into()).unwrap();
        assert_eq!(cleared, vec![OverrideUpdate::clear("b".into())]);
        assert!(board.snapshot().dependencies.is_empty());

        assert!(matches!(
            board.unlink(&"a".into(), &"b".into()),
            Err(BoardError::Store(_))
        ));
    }

    #[test]
    fn move_subgraph_applies_overrides() {
        let board = board();
        let updates = board.move_subgraph(&"a".into(), 3).unwrap();
        assert_eq!(
            updates,
            vec![
                OverrideUpdate::set("a".into(), 3),
                OverrideUpdate::set("b".into(), 4)
            ]
        );
        let layering = board.layering();
        assert_eq!(layering.layer_of(&"a".into()), Some(3));
        assert_eq!(layering.layer_of(&"b".into()), Some(4));

        assert!(matches!(
            board.move_subgraph(&"dump".into(), 1),
            Err(BoardError::DumpBucket(_))
        ));
    }

    #[test]
    fn move_out_of_range_writes_nothing() {
        let board = board();
        assert!(matches!(
            board.move_subgraph(&"a".into(), i64::MAX),
            Err(BoardError::LayerOutOfRange(_))
        ));
        assert!(matches!(
            board.move_subgraph(&"b".into(), i64::MIN),
            Err(BoardError::LayerOutOfRange(_))
        ));
        assert_eq!(board.snapshot().overridden().count(), 0);
    }

    #[test]
    fn far_override_in_store_still_layers() {
        let board = board();
        board.store().set_layer_override(&"c".into(), Some(i64::MAX)).unwrap();
        let layering = board.layering();
        assert_eq!(layering.layer_of(&"c".into()), Some(MAX_LAYER_OVERRIDE));
        assert_eq!(board.drop_targets_by_lane().len(), layering.len() + 1);
        assert!(board.move_subgraph(&"c".into(), 2).is_ok());
    }

    #[test]
    fn lane_moves_account_for_negative_base() {
        let board = board();
        board.store().set_layer_override(&"c".into(), Some(-2)).unwrap();
        assert_eq!(board.layering().base(), -2);

        // Lane 3 is layer 1 once the base sits at -2.
        board.move_subgraph_to_lane(&"a".into(), 3).unwrap();
        let layering = board.layering();
        assert_eq!(layering.lane_of(&"a".into()), Some(3));
        assert_eq!(layering.layer_of(&"a".into()), Some(1));
        assert_eq!(layering.layer_of(&"b".into()), Some(2));
    }

    #[test]
    fn unlink_all_empties_the_layering() {
        let board = board();
        board.link(Dependency::new("b", "c")).unwrap();
        board.move_subgraph(&"a".into(), 2).unwrap();

        assert_eq!(board.unlink_all().unwrap(), 2);
        let snapshot = board.snapshot();
        assert!(snapshot.dependencies.is_empty());
        assert_eq!(snapshot.overridden().count(), 0);
        assert!(board.layering().is_empty());
    }

    #[test]
    fn reset_commands_clear_overrides() {
        let board = board();
        board.move_subgraph(&"a".into(), 5).unwrap();
        board.reset_layer(&"a".into()).unwrap();
        assert_eq!(board.snapshot().overridden().count(), 1);
        board.reset_all_layers().unwrap();
        assert_eq!(board.snapshot().overridden().count(), 0);
    }

    #[test]
    fn read_queries_use_current_store_state() {
        let board = board();
        let chains = board.chains();
        assert_eq!(chains.len(), 1);
        assert_eq!(names(&chains[0]), ["a", "b"]);
        assert_eq!(board.pairs(), vec![(BucketId::from("a"), BucketId::from("b"))]);
        assert_eq!(board.drop_targets_by_lane().len(), board.layering().len() + 1);
        assert!(board.conflicts().is_empty());

        board.link(Dependency::new("c", "a")).unwrap();
        let chains = board.chains();
        assert_eq!(chains.len(), 1);
        assert_eq!(names(&chains[0]), ["c", "a", "b"]);
        assert_eq!(board.link_candidates(&"c".into()), Vec::<BucketId>::new());
    }
}

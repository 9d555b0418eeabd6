//! Resolution of target identifiers into live snapshots.

use herald_core::{EntitySnapshot, StateStore, is_group};
use std::sync::Arc;
use tracing::debug;

/// Reads snapshots from the host state store.
///
/// Missing entities are skipped, never reported as errors.
#[derive(Clone)]
pub struct StateResolver {
    store: Arc<dyn StateStore>,
}

impl StateResolver {
    /// Create a resolver over a state store.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Resolve a single entity or a group.
    ///
    /// For a group, members are resolved in the order the store lists them.
    /// With `include_group_metadata`, a synthetic snapshot of the group itself
    /// comes first. A missing group yields an empty sequence.
    pub fn resolve(&self, target_id: &str, include_group_metadata: bool) -> Vec<EntitySnapshot> {
        let snapshots: Vec<EntitySnapshot> = if is_group(target_id) {
            let Some(group) = self.store.get(target_id) else {
                debug!(target_id, "group not found in state store");
                return Vec::new();
            };
            let header = include_group_metadata.then(|| EntitySnapshot::group_header(&group));
            header
                .into_iter()
                .chain(group.members().into_iter().filter_map(|m| self.snapshot(m)))
                .collect()
        } else {
            self.snapshot(target_id).into_iter().collect()
        };

        debug!(target_id, ?snapshots, "target entity state");
        snapshots
    }

    /// Resolve several identifiers and concatenate the results.
    pub fn resolve_all<'a, I>(&self, target_ids: I) -> Vec<EntitySnapshot>
    where
        I: IntoIterator<Item = &'a str>,
    {
        target_ids
            .into_iter()
            .flat_map(|id| self.resolve(id, false))
            .collect()
    }

    /// Snapshot one entity, `None` when it does not exist.
    pub fn snapshot(&self, entity_id: &str) -> Option<EntitySnapshot> {
        let state = self.store.get(entity_id);
        if state.is_none() {
            debug!(entity = entity_id, "entity not found in state store, skipping");
        }
        state.as_ref().map(EntitySnapshot::from_state)
    }
}

impl std::fmt::Debug for StateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateResolver").finish_non_exhaustive()
    }
}

//! Storage backend contract
//!
//! Multiple units of work across different execution contexts may target
//! the same store concurrently; the store alone serializes the
//! prepare..commit/cancel window. The recommended minimum is a
//! single-writer, multiple-reader discipline: shared lock for reads,
//! exclusive lock spanning the staged window.

use crate::entity::EntityState;
use crate::state::EntityReference;

use super::EntityStoreError;

/// The storage backend contract.
pub trait EntityStore: Send + Sync {
    /// Returns a fresh state (status NEW, version 0) for `identity`.
    ///
    /// Fails with `AlreadyExists` if the identity is already durable. The
    /// state does not become durable until a prepared change set commits.
    fn new_entity_state(&self, identity: &EntityReference)
        -> Result<EntityState, EntityStoreError>;

    /// Returns the current durable state (status LOADED) for `identity`.
    ///
    /// Fails with `NotFound` if absent or removed.
    fn entity_state(&self, identity: &EntityReference) -> Result<EntityState, EntityStoreError>;

    /// Validates and stages a change set without making it durable or
    /// visible to concurrent readers.
    ///
    /// Must detect version conflicts: a changed state whose version
    /// differs from the store's current durable version fails with
    /// `ConcurrentModification` and no usable committer is returned.
    /// Detection may additionally be repeated under the commit lock, but
    /// must in all cases precede the first irrevocable durable write.
    fn prepare(
        &self,
        new_states: Vec<EntityState>,
        changed_states: Vec<EntityState>,
        removed: Vec<EntityReference>,
    ) -> Result<Box<dyn StateCommitter>, EntityStoreError>;

    /// Full scan over all durable states, used for rebuild/reindex.
    fn iter(&self) -> Box<dyn Iterator<Item = Result<EntityState, EntityStoreError>> + Send + '_>;
}

/// Finalizes or aborts one staged change set.
///
/// Single-use: both operations consume the committer.
pub trait StateCommitter: std::fmt::Debug {
    /// Makes the staged changes durable and visible atomically. Each
    /// committed new/changed entity's version increases by exactly 1;
    /// removed identities become unreadable.
    ///
    /// A failing commit must leave the store as if `cancel` had been
    /// called.
    fn commit(self: Box<Self>) -> Result<(), EntityStoreError>;

    /// Reverts the staged changes with no durable effect. Safe to call
    /// even after a partial internal failure during prepare.
    fn cancel(self: Box<Self>);
}

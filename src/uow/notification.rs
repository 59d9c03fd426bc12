//! Change notification feed
//!
//! One `ChangeSet` per successfully completed root unit of work, delivered
//! after the durable commit. Indexing, search, and event-sourcing
//! collaborators consume this feed; the grouping per transaction is part
//! of the contract.

use crate::entity::EntityState;
use crate::state::EntityReference;

/// The durable outcome of one root unit of work.
///
/// States carry their post-commit versions.
#[derive(Clone, Debug)]
pub struct ChangeSet {
    new: Vec<EntityState>,
    changed: Vec<EntityState>,
    removed: Vec<EntityReference>,
}

impl ChangeSet {
    pub(crate) fn new(
        new: Vec<EntityState>,
        changed: Vec<EntityState>,
        removed: Vec<EntityReference>,
    ) -> Self {
        Self {
            new,
            changed,
            removed,
        }
    }

    /// Entities that became durable for the first time.
    #[inline]
    pub fn new_states(&self) -> &[EntityState] {
        &self.new
    }

    /// Entities whose durable state was replaced.
    #[inline]
    pub fn changed_states(&self) -> &[EntityState] {
        &self.changed
    }

    /// Identities that became unreadable.
    #[inline]
    pub fn removed(&self) -> &[EntityReference] {
        &self.removed
    }

    /// Returns true if the transaction had no durable effect.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Consumer of the per-transaction change feed.
pub trait ChangeObserver: Send + Sync {
    /// Called once per completed root unit of work, after durable commit.
    fn on_change(&self, changes: &ChangeSet);
}

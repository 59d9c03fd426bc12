//! EntityState - Versioned persisted representation of one entity
//!
//! Created by `EntityStore::new_entity_state` (status NEW, version 0) or
//! loaded from a store (status LOADED). Versions advance by exactly 1 on
//! each successful commit of a new or changed entity; the store owns that
//! transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::{EntityReference, StateHolder};

/// Life-cycle status of an entity within a unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    /// Created in the current unit of work, never durable.
    New,
    /// Loaded from the store, unmodified.
    Loaded,
    /// Loaded from the store and modified.
    Updated,
    /// Marked for removal.
    Removed,
}

impl EntityStatus {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::New => "NEW",
            EntityStatus::Loaded => "LOADED",
            EntityStatus::Updated => "UPDATED",
            EntityStatus::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The versioned, persisted state of one entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityState {
    identity: EntityReference,
    version: u64,
    last_modified: DateTime<Utc>,
    status: EntityStatus,
    state: StateHolder,
}

impl EntityState {
    /// Creates a fresh, never-durable state (status NEW, version 0).
    pub fn new(identity: EntityReference) -> Self {
        Self {
            identity,
            version: 0,
            last_modified: Utc::now(),
            status: EntityStatus::New,
            state: StateHolder::new(),
        }
    }

    /// Reconstructs a durable state as read from a store (status LOADED).
    pub fn loaded(
        identity: EntityReference,
        version: u64,
        last_modified: DateTime<Utc>,
        state: StateHolder,
    ) -> Self {
        Self {
            identity,
            version,
            last_modified,
            status: EntityStatus::Loaded,
            state,
        }
    }

    /// Returns the entity identity.
    #[inline]
    pub fn identity(&self) -> &EntityReference {
        &self.identity
    }

    /// Returns the version this state was created or loaded at.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the last durable modification time.
    #[inline]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns the life-cycle status.
    #[inline]
    pub fn status(&self) -> EntityStatus {
        self.status
    }

    /// Returns the property and association values.
    #[inline]
    pub fn state(&self) -> &StateHolder {
        &self.state
    }

    /// Returns the values for mutation. Callers are responsible for the
    /// LOADED → UPDATED transition (see `mark_updated`).
    #[inline]
    pub fn state_mut(&mut self) -> &mut StateHolder {
        &mut self.state
    }

    /// Records that the state was modified: LOADED becomes UPDATED; the
    /// other statuses already imply their fate.
    pub fn mark_updated(&mut self) {
        if self.status == EntityStatus::Loaded {
            self.status = EntityStatus::Updated;
        }
    }

    /// Marks the entity for removal.
    pub fn mark_removed(&mut self) {
        self.status = EntityStatus::Removed;
    }

    /// Returns true if completion must write this state.
    pub fn is_dirty(&self) -> bool {
        matches!(self.status, EntityStatus::New | EntityStatus::Updated)
    }

    /// Advance to the post-commit version. Used when reporting committed
    /// change sets; durable bookkeeping itself lives in the store.
    pub(crate) fn advance_version(&mut self) {
        self.version += 1;
        self.last_modified = Utc::now();
    }
}

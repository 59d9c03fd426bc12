//! In-memory reference entity store
//!
//! Shared-read/exclusive-write over one map. Version conflicts are
//! detected eagerly at prepare and re-validated under the exclusive commit
//! lock, so detection always precedes the first durable mutation even when
//! another committer raced in between.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::entity::EntityState;
use crate::observability::{Event, Logger};
use crate::state::{EntityReference, StateHolder};

use super::{EntityStore, EntityStoreError, StateCommitter};

struct DurableEntry {
    version: u64,
    last_modified: DateTime<Utc>,
    state: StateHolder,
}

type Entries = BTreeMap<EntityReference, DurableEntry>;

/// Reference `EntityStore` keeping all durable state in memory.
#[derive(Default)]
pub struct MemoryEntityStore {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryEntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of durable entities.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns true if no entity is durable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_poisoned() -> EntityStoreError {
    EntityStoreError::Backend("store lock poisoned".to_string())
}

fn validate(
    entries: &Entries,
    new_states: &[EntityState],
    changed_states: &[EntityState],
    removed: &[EntityReference],
) -> Result<(), EntityStoreError> {
    for state in new_states {
        if entries.contains_key(state.identity()) {
            return Err(EntityStoreError::AlreadyExists(state.identity().clone()));
        }
    }
    for state in changed_states {
        match entries.get(state.identity()) {
            None => return Err(EntityStoreError::NotFound(state.identity().clone())),
            Some(entry) if entry.version != state.version() => {
                return Err(EntityStoreError::ConcurrentModification {
                    identity: state.identity().clone(),
                    expected: state.version(),
                    actual: entry.version,
                });
            }
            Some(_) => {}
        }
    }
    for identity in removed {
        if !entries.contains_key(identity) {
            return Err(EntityStoreError::NotFound(identity.clone()));
        }
    }
    Ok(())
}

impl EntityStore for MemoryEntityStore {
    fn new_entity_state(
        &self,
        identity: &EntityReference,
    ) -> Result<EntityState, EntityStoreError> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        if entries.contains_key(identity) {
            return Err(EntityStoreError::AlreadyExists(identity.clone()));
        }
        Ok(EntityState::new(identity.clone()))
    }

    fn entity_state(&self, identity: &EntityReference) -> Result<EntityState, EntityStoreError> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        let entry = entries
            .get(identity)
            .ok_or_else(|| EntityStoreError::NotFound(identity.clone()))?;
        Ok(EntityState::loaded(
            identity.clone(),
            entry.version,
            entry.last_modified,
            entry.state.clone(),
        ))
    }

    fn prepare(
        &self,
        new_states: Vec<EntityState>,
        changed_states: Vec<EntityState>,
        removed: Vec<EntityReference>,
    ) -> Result<Box<dyn StateCommitter>, EntityStoreError> {
        {
            let entries = self.entries.read().map_err(|_| lock_poisoned())?;
            validate(&entries, &new_states, &changed_states, &removed)?;
        }

        let new_count = new_states.len().to_string();
        let changed_count = changed_states.len().to_string();
        let removed_count = removed.len().to_string();
        Logger::info(
            Event::StorePrepared.as_str(),
            &[
                ("new", new_count.as_str()),
                ("changed", changed_count.as_str()),
                ("removed", removed_count.as_str()),
            ],
        );

        Ok(Box::new(MemoryCommitter {
            entries: Arc::clone(&self.entries),
            new_states,
            changed_states,
            removed,
        }))
    }

    fn iter(&self) -> Box<dyn Iterator<Item = Result<EntityState, EntityStoreError>> + Send + '_> {
        // Snapshot under the shared lock; iteration must not block writers.
        let snapshot: Vec<Result<EntityState, EntityStoreError>> = match self.entries.read() {
            Ok(entries) => entries
                .iter()
                .map(|(identity, entry)| {
                    Ok(EntityState::loaded(
                        identity.clone(),
                        entry.version,
                        entry.last_modified,
                        entry.state.clone(),
                    ))
                })
                .collect(),
            Err(_) => vec![Err(lock_poisoned())],
        };
        Box::new(snapshot.into_iter())
    }
}

struct MemoryCommitter {
    entries: Arc<RwLock<Entries>>,
    new_states: Vec<EntityState>,
    changed_states: Vec<EntityState>,
    removed: Vec<EntityReference>,
}

impl std::fmt::Debug for MemoryCommitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCommitter").finish_non_exhaustive()
    }
}

impl StateCommitter for MemoryCommitter {
    fn commit(self: Box<Self>) -> Result<(), EntityStoreError> {
        let MemoryCommitter {
            entries,
            new_states,
            changed_states,
            removed,
        } = *self;

        let mut entries = entries.write().map_err(|_| lock_poisoned())?;

        // Conflict detection must precede the first durable mutation; the
        // eager check at prepare does not hold the lock across the window.
        validate(&entries, &new_states, &changed_states, &removed)?;

        let now = Utc::now();
        for state in new_states.into_iter().chain(changed_states) {
            let entry = DurableEntry {
                version: state.version() + 1,
                last_modified: now,
                state: state.state().clone(),
            };
            entries.insert(state.identity().clone(), entry);
        }
        for identity in &removed {
            entries.remove(identity);
        }

        Logger::info(Event::StoreCommitted.as_str(), &[]);
        Ok(())
    }

    fn cancel(self: Box<Self>) {
        // Nothing was shared; dropping the staged vectors reverts it all.
        Logger::info(Event::StoreCancelled.as_str(), &[]);
    }
}

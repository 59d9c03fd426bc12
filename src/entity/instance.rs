//! Composite and entity instances
//!
//! A `CompositeInstance` is the immutable pairing of one model with one
//! state holder; callers hold the instance, never the model or state
//! directly. An `EntityInstance` pairs a model with persisted
//! `EntityState`; the `EntityHandle` callers hold additionally pins the
//! owning `UnitOfWork`.
//!
//! Instances hold no internal locks and must not be shared across threads
//! without external synchronization.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::{InvocationError, InvocationResult};
use crate::entity::{EntityState, EntityStatus};
use crate::model::CompositeModel;
use crate::state::{EntityReference, StateHolder};
use crate::uow::UnitOfWork;

/// A live handle for a non-entity composite: one model, one state holder.
pub struct CompositeInstance {
    model: Arc<CompositeModel>,
    state: StateHolder,
}

impl CompositeInstance {
    /// Creates an instance with empty state.
    pub fn new(model: Arc<CompositeModel>) -> Self {
        Self::with_state(model, StateHolder::new())
    }

    /// Creates an instance over existing state.
    pub fn with_state(model: Arc<CompositeModel>, state: StateHolder) -> Self {
        Self { model, state }
    }

    /// Returns the shared dispatch model.
    #[inline]
    pub fn model(&self) -> &Arc<CompositeModel> {
        &self.model
    }

    /// Execute a declared method against this instance.
    pub fn invoke(&mut self, method: &str, args: &[Value]) -> InvocationResult {
        self.model.invoke(method, &mut self.state, args)
    }

    /// Unwraps the backing state. For introspection and SPI use only;
    /// application logic goes through `invoke`.
    pub fn dereference(&self) -> &StateHolder {
        &self.state
    }
}

/// A live entity: one model bound to persisted entity state.
#[derive(Clone)]
pub struct EntityInstance {
    model: Arc<CompositeModel>,
    state: EntityState,
}

impl EntityInstance {
    pub(crate) fn new(model: Arc<CompositeModel>, state: EntityState) -> Self {
        Self { model, state }
    }

    /// Returns the shared dispatch model.
    #[inline]
    pub fn model(&self) -> &Arc<CompositeModel> {
        &self.model
    }

    /// Returns the persisted entity state.
    #[inline]
    pub fn entity_state(&self) -> &EntityState {
        &self.state
    }

    pub(crate) fn entity_state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }

    /// Execute a declared method against the entity state.
    ///
    /// A write through any fragment marks the state dirty, moving LOADED
    /// to UPDATED.
    pub fn invoke(&mut self, method: &str, args: &[Value]) -> InvocationResult {
        if self.state.status() == EntityStatus::Removed {
            return Err(InvocationError::entity_removed(self.state.identity().clone()));
        }
        let before = self.state.state().mutation_count();
        let result = self.model.invoke(method, self.state.state_mut(), args);
        if self.state.state().mutation_count() != before {
            self.state.mark_updated();
        }
        result
    }
}

/// The handle callers hold for an entity tracked by a unit of work.
///
/// Cheap to clone; clones address the same instance.
#[derive(Clone)]
pub struct EntityHandle {
    uow: UnitOfWork,
    inner: Rc<RefCell<EntityInstance>>,
}

impl std::fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandle").finish_non_exhaustive()
    }
}

impl EntityHandle {
    pub(crate) fn new(uow: UnitOfWork, inner: Rc<RefCell<EntityInstance>>) -> Self {
        Self { uow, inner }
    }

    /// Returns the entity identity.
    pub fn identity(&self) -> EntityReference {
        self.inner.borrow().entity_state().identity().clone()
    }

    /// Returns the entity's current life-cycle status.
    pub fn status(&self) -> EntityStatus {
        self.inner.borrow().entity_state().status()
    }

    /// Returns the version the entity was created or loaded at.
    pub fn version(&self) -> u64 {
        self.inner.borrow().entity_state().version()
    }

    /// Returns the unit of work tracking this entity.
    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }

    /// Execute a declared method against the entity.
    ///
    /// Fails if the owning unit of work is no longer open or the entity
    /// was removed.
    pub fn invoke(&self, method: &str, args: &[Value]) -> InvocationResult {
        if !self.uow.is_open() {
            return Err(InvocationError::stale_unit_of_work(self.identity()));
        }
        self.inner.borrow_mut().invoke(method, args)
    }

    /// Unwraps the backing instance. For introspection and SPI use only;
    /// application logic goes through `invoke`.
    pub fn dereference(&self) -> Rc<RefCell<EntityInstance>> {
        Rc::clone(&self.inner)
    }
}

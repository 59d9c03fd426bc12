//! UnitOfWork - Transaction scope over tracked entity instances
//!
//! A UnitOfWork is a cheap clonable handle bound to one execution context;
//! it is deliberately not Send. Clones address the same scope. The scope
//! moves OPEN → COMPLETED or OPEN → DISCARDED exactly once; operations
//! through any clone fail once the scope is terminal.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::entity::{EntityHandle, EntityInstance, EntityState, EntityStatus};
use crate::model::CompositeModel;
use crate::observability::{Event, Logger, ObservationScope};
use crate::state::EntityReference;
use crate::store::EntityStore;

use super::errors::{CallbackError, UnitOfWorkError};
use super::notification::{ChangeObserver, ChangeSet};

/// Life-cycle status of a unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitOfWorkStatus {
    /// Accepting operations.
    Open,
    /// Completed; root-level changes are durable.
    Completed,
    /// Discarded; tracked changes were dropped.
    Discarded,
}

impl UnitOfWorkStatus {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfWorkStatus::Open => "OPEN",
            UnitOfWorkStatus::Completed => "COMPLETED",
            UnitOfWorkStatus::Discarded => "DISCARDED",
        }
    }
}

impl fmt::Display for UnitOfWorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Completion life-cycle hooks.
///
/// `before_completion` may veto, which forces a discard. An error from
/// `after_completion` is logged and swallowed.
pub trait UnitOfWorkCallback {
    /// Invoked before the store protocol (or merge) runs.
    fn before_completion(&mut self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Invoked after the scope reached its terminal status.
    fn after_completion(&mut self, _status: UnitOfWorkStatus) -> Result<(), CallbackError> {
        Ok(())
    }
}

pub(crate) struct UowInner {
    store: Arc<dyn EntityStore>,
    observers: Vec<Arc<dyn ChangeObserver>>,
    status: UnitOfWorkStatus,
    instances: BTreeMap<EntityReference, Rc<RefCell<EntityInstance>>>,
    callbacks: Vec<Box<dyn UnitOfWorkCallback>>,
    parent: Option<UnitOfWork>,
}

/// A transaction scope tracking in-flight entity creation, mutation, and
/// removal.
#[derive(Clone)]
pub struct UnitOfWork {
    inner: Rc<RefCell<UowInner>>,
}

impl UnitOfWork {
    pub(crate) fn root(
        store: Arc<dyn EntityStore>,
        observers: Vec<Arc<dyn ChangeObserver>>,
    ) -> Self {
        Logger::info(Event::UnitOfWorkOpened.as_str(), &[("nested", "false")]);
        Self {
            inner: Rc::new(RefCell::new(UowInner {
                store,
                observers,
                status: UnitOfWorkStatus::Open,
                instances: BTreeMap::new(),
                callbacks: Vec::new(),
                parent: None,
            })),
        }
    }

    /// Opens a child scope over the same store.
    ///
    /// Entities reached through the child are shadow copies; their
    /// mutations become visible to this scope only when the child
    /// completes.
    pub fn nested(&self) -> Result<UnitOfWork, UnitOfWorkError> {
        self.ensure_open()?;
        let store = Arc::clone(&self.inner.borrow().store);
        Logger::info(Event::UnitOfWorkOpened.as_str(), &[("nested", "true")]);
        Ok(Self {
            inner: Rc::new(RefCell::new(UowInner {
                store,
                observers: Vec::new(),
                status: UnitOfWorkStatus::Open,
                instances: BTreeMap::new(),
                callbacks: Vec::new(),
                parent: Some(self.clone()),
            })),
        })
    }

    /// Returns the scope status.
    pub fn status(&self) -> UnitOfWorkStatus {
        self.inner.borrow().status
    }

    /// Returns true while the scope accepts operations.
    pub fn is_open(&self) -> bool {
        self.status() == UnitOfWorkStatus::Open
    }

    /// Returns true for a root scope.
    pub fn is_root(&self) -> bool {
        self.inner.borrow().parent.is_none()
    }

    /// Returns the number of tracked entities.
    pub fn tracked_count(&self) -> usize {
        self.inner.borrow().instances.len()
    }

    /// Returns true if `other` is a clone of this same scope.
    pub fn scope_eq(&self, other: &UnitOfWork) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_open(&self) -> Result<(), UnitOfWorkError> {
        let status = self.status();
        if status == UnitOfWorkStatus::Open {
            Ok(())
        } else {
            Err(UnitOfWorkError::NotOpen(status))
        }
    }

    /// Creates an entity with a generated identity.
    pub fn create(&self, model: &Arc<CompositeModel>) -> Result<EntityHandle, UnitOfWorkError> {
        self.create_with_identity(model, EntityReference::generate())
    }

    /// Creates an entity under the given identity.
    ///
    /// Fails with `AlreadyExists` if the identity is durable, or
    /// `AlreadyTracked` if this scope (or an enclosing one) already tracks
    /// it.
    pub fn create_with_identity(
        &self,
        model: &Arc<CompositeModel>,
        identity: EntityReference,
    ) -> Result<EntityHandle, UnitOfWorkError> {
        self.ensure_open()?;
        if self.inner.borrow().instances.contains_key(&identity)
            || self.ancestor_instance(&identity).is_some()
        {
            return Err(UnitOfWorkError::AlreadyTracked(identity));
        }
        let state = self.inner.borrow().store.new_entity_state(&identity)?;
        let instance = Rc::new(RefCell::new(EntityInstance::new(Arc::clone(model), state)));
        self.inner
            .borrow_mut()
            .instances
            .insert(identity, Rc::clone(&instance));
        Ok(EntityHandle::new(self.clone(), instance))
    }

    /// Returns a handle for the entity with the given identity.
    ///
    /// Resolution order: this scope's tracked set, then shadow copies from
    /// enclosing scopes, then the store. Fails with `NotFound` if the
    /// entity is absent or removed.
    pub fn get(
        &self,
        model: &Arc<CompositeModel>,
        identity: &EntityReference,
    ) -> Result<EntityHandle, UnitOfWorkError> {
        self.ensure_open()?;

        if let Some(instance) = self.inner.borrow().instances.get(identity).cloned() {
            if instance.borrow().entity_state().status() == EntityStatus::Removed {
                return Err(crate::store::EntityStoreError::NotFound(identity.clone()).into());
            }
            return Ok(EntityHandle::new(self.clone(), instance));
        }

        let instance = match self.ancestor_instance(identity) {
            Some(source) => {
                let copy = source.borrow().clone();
                if copy.entity_state().status() == EntityStatus::Removed {
                    return Err(
                        crate::store::EntityStoreError::NotFound(identity.clone()).into()
                    );
                }
                Rc::new(RefCell::new(copy))
            }
            None => {
                let state = self.inner.borrow().store.entity_state(identity)?;
                Rc::new(RefCell::new(EntityInstance::new(Arc::clone(model), state)))
            }
        };

        self.inner
            .borrow_mut()
            .instances
            .insert(identity.clone(), Rc::clone(&instance));
        Ok(EntityHandle::new(self.clone(), instance))
    }

    /// Marks the entity for removal.
    ///
    /// The removal becomes durable at root completion. A never-durable
    /// entity simply vanishes.
    pub fn remove(&self, handle: &EntityHandle) -> Result<(), UnitOfWorkError> {
        self.ensure_open()?;
        let identity = handle.identity();
        let instance = self
            .inner
            .borrow()
            .instances
            .get(&identity)
            .cloned()
            .ok_or_else(|| {
                UnitOfWorkError::Store(crate::store::EntityStoreError::NotFound(identity.clone()))
            })?;
        instance.borrow_mut().entity_state_mut().mark_removed();
        Ok(())
    }

    /// Registers a completion callback. Callbacks run in registration
    /// order.
    pub fn register_callback(
        &self,
        callback: Box<dyn UnitOfWorkCallback>,
    ) -> Result<(), UnitOfWorkError> {
        self.ensure_open()?;
        self.inner.borrow_mut().callbacks.push(callback);
        Ok(())
    }

    /// Completes the scope.
    ///
    /// Runs before-completion callbacks (a veto discards the scope and
    /// surfaces `Vetoed`); then, at root level, stages and commits the
    /// tracked changes with the store and notifies change observers, or at
    /// child level merges into the parent. After-completion callbacks
    /// always run with the final status; their failures are logged only.
    pub fn complete(self) -> Result<(), UnitOfWorkError> {
        self.ensure_open()?;
        let mut callbacks = std::mem::take(&mut self.inner.borrow_mut().callbacks);

        for callback in callbacks.iter_mut() {
            if let Err(veto) = callback.before_completion() {
                self.finish(&mut callbacks, UnitOfWorkStatus::Discarded);
                return Err(UnitOfWorkError::Vetoed(veto));
            }
        }

        let parent = self.inner.borrow().parent.clone();
        let outcome = match parent {
            Some(parent) => self.merge_into(&parent),
            None => self.complete_root(),
        };

        match outcome {
            Ok(()) => {
                self.finish(&mut callbacks, UnitOfWorkStatus::Completed);
                Ok(())
            }
            Err(error) => {
                self.finish(&mut callbacks, UnitOfWorkStatus::Discarded);
                Err(error)
            }
        }
    }

    /// Discards the scope, dropping all tracked changes without contacting
    /// the store. After-completion callbacks fire with DISCARDED.
    pub fn discard(self) {
        if !self.is_open() {
            return;
        }
        let mut callbacks = std::mem::take(&mut self.inner.borrow_mut().callbacks);
        self.finish(&mut callbacks, UnitOfWorkStatus::Discarded);
    }

    fn complete_root(&self) -> Result<(), UnitOfWorkError> {
        let mut new_states: Vec<EntityState> = Vec::new();
        let mut changed_states: Vec<EntityState> = Vec::new();
        let mut removed: Vec<EntityReference> = Vec::new();

        {
            let inner = self.inner.borrow();
            for (identity, instance) in &inner.instances {
                let instance = instance.borrow();
                let state = instance.entity_state();
                match state.status() {
                    EntityStatus::New => new_states.push(state.clone()),
                    EntityStatus::Updated => changed_states.push(state.clone()),
                    EntityStatus::Loaded => {}
                    EntityStatus::Removed => {
                        // Version 0 was never durable; nothing to remove.
                        if state.version() > 0 {
                            removed.push(identity.clone());
                        }
                    }
                }
            }
        }

        if new_states.is_empty() && changed_states.is_empty() && removed.is_empty() {
            return Ok(());
        }

        let (store, observers) = {
            let inner = self.inner.borrow();
            (Arc::clone(&inner.store), inner.observers.clone())
        };

        let mut scope = ObservationScope::new("UOW_COMPLETE");
        scope.field("new", new_states.len().to_string());
        scope.field("changed", changed_states.len().to_string());
        scope.field("removed", removed.len().to_string());

        let committer = store.prepare(
            new_states.clone(),
            changed_states.clone(),
            removed.clone(),
        )?;
        committer.commit()?;
        scope.complete();

        for state in new_states.iter_mut().chain(changed_states.iter_mut()) {
            state.advance_version();
        }
        let changes = ChangeSet::new(new_states, changed_states, removed);
        for observer in &observers {
            observer.on_change(&changes);
        }

        Ok(())
    }

    fn merge_into(&self, parent: &UnitOfWork) -> Result<(), UnitOfWorkError> {
        parent.ensure_open()?;

        let child_inner = self.inner.borrow();
        let mut parent_inner = parent.inner.borrow_mut();
        for (identity, child_instance) in &child_inner.instances {
            let child_state = child_instance.borrow().entity_state().clone();
            // A clean shadow copy carries no information.
            if child_state.status() == EntityStatus::Loaded {
                continue;
            }
            match parent_inner.instances.get(identity) {
                Some(parent_instance) => {
                    *parent_instance.borrow_mut().entity_state_mut() = child_state;
                }
                None => {
                    let model = Arc::clone(child_instance.borrow().model());
                    parent_inner.instances.insert(
                        identity.clone(),
                        Rc::new(RefCell::new(EntityInstance::new(model, child_state))),
                    );
                }
            }
        }
        Ok(())
    }

    fn finish(
        &self,
        callbacks: &mut Vec<Box<dyn UnitOfWorkCallback>>,
        status: UnitOfWorkStatus,
    ) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.status = status;
            if status == UnitOfWorkStatus::Discarded {
                inner.instances.clear();
            }
        }

        for callback in callbacks.iter_mut() {
            if let Err(error) = callback.after_completion(status) {
                let message = error.to_string();
                Logger::warn(
                    Event::CallbackFailed.as_str(),
                    &[("error", message.as_str()), ("status", status.as_str())],
                );
            }
        }

        let event = match status {
            UnitOfWorkStatus::Completed => Event::UnitOfWorkCompleted,
            _ => Event::UnitOfWorkDiscarded,
        };
        Logger::info(event.as_str(), &[]);
    }

    fn ancestor_instance(
        &self,
        identity: &EntityReference,
    ) -> Option<Rc<RefCell<EntityInstance>>> {
        let mut scope = self.inner.borrow().parent.clone();
        while let Some(uow) = scope {
            let next = {
                let inner = uow.inner.borrow();
                if let Some(found) = inner.instances.get(identity) {
                    return Some(Rc::clone(found));
                }
                inner.parent.clone()
            };
            scope = next;
        }
        None
    }
}

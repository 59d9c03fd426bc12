//! UnitOfWorkFactory - Mints root unit-of-work scopes
//!
//! The factory owns the store handle and the registered change observers;
//! every root scope it opens carries a snapshot of both.

use std::sync::Arc;

use crate::store::EntityStore;

use super::notification::ChangeObserver;
use super::unit::UnitOfWork;

/// Factory for root unit-of-work scopes over one entity store.
pub struct UnitOfWorkFactory {
    store: Arc<dyn EntityStore>,
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl UnitOfWorkFactory {
    /// Creates a factory over the given store.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            observers: Vec::new(),
        }
    }

    /// Registers a change observer for all future root scopes.
    pub fn register_observer(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Opens a root unit of work.
    pub fn new_unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::root(Arc::clone(&self.store), self.observers.clone())
    }
}

//! Context-local "current" unit-of-work stack
//!
//! A call-site convenience only: the core engine never consults it.
//! `CurrentScope` is a drop guard, so nested scopes unwind in strict LIFO
//! order; a misnested drop is logged and the stack is left untouched
//! beyond the pop.

use std::cell::RefCell;

use crate::observability::{Event, Logger};

use super::unit::UnitOfWork;

thread_local! {
    static CURRENT: RefCell<Vec<UnitOfWork>> = const { RefCell::new(Vec::new()) };
}

/// Returns the innermost unit of work entered on this context, if any.
pub fn current() -> Option<UnitOfWork> {
    CURRENT.with(|stack| stack.borrow().last().cloned())
}

/// Guard marking a unit of work as "current" for its lexical extent.
pub struct CurrentScope {
    uow: UnitOfWork,
}

impl CurrentScope {
    /// Pushes the unit of work onto the context-local stack.
    pub fn enter(uow: UnitOfWork) -> Self {
        CURRENT.with(|stack| stack.borrow_mut().push(uow.clone()));
        Self { uow }
    }

    /// Returns the unit of work this scope pins.
    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }
}

impl Drop for CurrentScope {
    fn drop(&mut self) {
        CURRENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.pop() {
                Some(top) if top.scope_eq(&self.uow) => {}
                _ => Logger::warn(Event::ScopeMisnested.as_str(), &[]),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEntityStore;
    use std::sync::Arc;

    fn open() -> UnitOfWork {
        UnitOfWork::root(Arc::new(MemoryEntityStore::new()), Vec::new())
    }

    #[test]
    fn test_current_is_empty_outside_any_scope() {
        assert!(current().is_none());
    }

    #[test]
    fn test_scopes_nest_lifo() {
        let outer = open();
        let guard = CurrentScope::enter(outer.clone());
        assert!(current().unwrap().scope_eq(&outer));

        {
            let inner = open();
            let _inner_guard = CurrentScope::enter(inner.clone());
            assert!(current().unwrap().scope_eq(&inner));
        }

        assert!(current().unwrap().scope_eq(&outer));
        drop(guard);
        assert!(current().is_none());
    }
}

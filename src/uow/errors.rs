//! Unit-of-work error types

use thiserror::Error;

use crate::state::EntityReference;
use crate::store::EntityStoreError;

use super::unit::UnitOfWorkStatus;

/// Error raised by a completion callback.
///
/// From `before_completion` it vetoes the completion; from
/// `after_completion` it is logged and swallowed.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CallbackError(String);

impl CallbackError {
    /// Creates a callback error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Failures surfaced by unit-of-work operations.
#[derive(Debug, Error)]
pub enum UnitOfWorkError {
    /// The unit of work already completed or was discarded.
    #[error("unit of work is not open (status: {0})")]
    NotOpen(UnitOfWorkStatus),

    /// The identity is already tracked in this scope or an enclosing one.
    #[error("entity `{0}` is already tracked in this unit of work")]
    AlreadyTracked(EntityReference),

    /// A before-completion callback vetoed the completion.
    ///
    /// The unit of work has been discarded.
    #[error("completion vetoed: {0}")]
    Vetoed(CallbackError),

    /// The entity store rejected or failed an operation.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veto_display_carries_reason() {
        let err = UnitOfWorkError::Vetoed(CallbackError::new("books not balanced"));
        assert!(err.to_string().contains("books not balanced"));
    }

    #[test]
    fn test_store_errors_pass_through() {
        let err: UnitOfWorkError =
            EntityStoreError::NotFound(EntityReference::new("e1")).into();
        assert!(err.to_string().contains("e1"));
    }
}

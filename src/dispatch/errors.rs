//! Dispatch error types
//!
//! An `InvocationError` raised by a concern or mixin propagates to the
//! caller verbatim unless an enclosing concern intercepts it. Side-effect
//! errors are the one category that never propagates.

use serde_json::Value;
use thiserror::Error;

use crate::state::EntityReference;

/// Result of one method invocation.
pub type InvocationResult = Result<Value, InvocationError>;

/// Errors raised while dispatching a method call.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// The method is not declared by the composite's capability set.
    #[error("composite `{composite}` has no method `{method}`")]
    UnknownMethod { composite: String, method: String },

    /// The call site supplied unusable arguments.
    #[error("method `{method}` expects {expected}")]
    InvalidArguments { method: String, expected: String },

    /// The target entity was removed in the current unit of work.
    #[error("entity `{identity}` has been removed")]
    EntityRemoved { identity: EntityReference },

    /// The entity's unit of work already completed or was discarded.
    #[error("unit of work is no longer open; entity `{identity}` is unreachable")]
    StaleUnitOfWork { identity: EntityReference },

    /// A fragment failed.
    #[error("method `{method}` failed: {message}")]
    Failed { method: String, message: String },
}

impl InvocationError {
    /// Create an unknown-method error.
    pub fn unknown_method(composite: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            composite: composite.into(),
            method: method.into(),
        }
    }

    /// Create an invalid-arguments error.
    pub fn invalid_arguments(method: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            expected: expected.into(),
        }
    }

    /// Create a removed-entity error.
    pub fn entity_removed(identity: EntityReference) -> Self {
        Self::EntityRemoved { identity }
    }

    /// Create a stale-unit-of-work error.
    pub fn stale_unit_of_work(identity: EntityReference) -> Self {
        Self::StaleUnitOfWork { identity }
    }

    /// Create a fragment-failure error.
    pub fn failed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            method: method.into(),
            message: message.into(),
        }
    }
}

//! Observable events
//!
//! Events are explicit and typed; free-form event strings are reserved for
//! observation scopes, which derive their names from the scope label.

use std::fmt;

/// Observable events in the dispatch and transaction engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Model building
    /// A composite model was built and registered
    ModelRegistered,

    // Dispatch
    /// A side-effect fragment failed; the failure was swallowed
    SideEffectFailed,

    // Unit of work life cycle
    /// A unit of work was opened
    UnitOfWorkOpened,
    /// A unit of work completed and its changes are durable
    UnitOfWorkCompleted,
    /// A unit of work was discarded
    UnitOfWorkDiscarded,
    /// An after-completion callback failed; the failure was swallowed
    CallbackFailed,
    /// The current-scope stack unwound out of LIFO order
    ScopeMisnested,

    // Store protocol
    /// A change set was staged with the entity store
    StorePrepared,
    /// A staged change set became durable
    StoreCommitted,
    /// A staged change set was reverted
    StoreCancelled,
}

impl Event {
    /// Returns the canonical event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ModelRegistered => "MODEL_REGISTERED",
            Event::SideEffectFailed => "SIDE_EFFECT_FAILED",
            Event::UnitOfWorkOpened => "UOW_OPENED",
            Event::UnitOfWorkCompleted => "UOW_COMPLETED",
            Event::UnitOfWorkDiscarded => "UOW_DISCARDED",
            Event::CallbackFailed => "CALLBACK_FAILED",
            Event::ScopeMisnested => "SCOPE_MISNESTED",
            Event::StorePrepared => "STORE_PREPARED",
            Event::StoreCommitted => "STORE_COMMITTED",
            Event::StoreCancelled => "STORE_CANCELLED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

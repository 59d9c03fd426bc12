//! Structured observability
//!
//! - Structured logs (JSON), one line per event
//! - Deterministic key ordering
//! - Synchronous, no buffering, no background threads
//!
//! Logging is the only outlet for the two deliberately swallowed failure
//! categories: side-effect errors and after-completion callback errors.
//! Observability is read-only and must never affect dispatch or commit
//! outcomes.

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

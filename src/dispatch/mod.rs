//! # Fragment Dispatch Engine
//!
//! Walks a composite model's fragment chain for one method call against one
//! state holder. Execution is synchronous and single-threaded per call:
//! concerns outermost-first, the selected mixin, then side-effects whose
//! failures are logged and never propagated.

pub mod errors;

mod engine;

pub use errors::{InvocationError, InvocationResult};

pub(crate) use engine::run_chain;

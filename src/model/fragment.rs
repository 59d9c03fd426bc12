//! Fragment traits and the chain walker
//!
//! A method's behavior is composed from three fragment roles:
//!
//! - `Concern` wraps the call. It may transform arguments, short-circuit
//!   without reaching the mixin, or rewrite the returned value.
//! - `Mixin` is the single primary implementation.
//! - `SideEffect` observes the finished outcome. Its errors are logged and
//!   discarded, never surfaced to the caller.
//!
//! `Next` hands each concern the remainder of the chain. Execution is
//! synchronous; there are no suspension points inside a chain.

use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::InvocationResult;
use crate::state::StateHolder;

/// Identity of one in-flight method call.
#[derive(Clone, Copy, Debug)]
pub struct MethodCall<'a> {
    composite: &'a str,
    method: &'a str,
}

impl<'a> MethodCall<'a> {
    pub(crate) fn new(composite: &'a str, method: &'a str) -> Self {
        Self { composite, method }
    }

    /// Returns the composite type name.
    #[inline]
    pub fn composite(&self) -> &'a str {
        self.composite
    }

    /// Returns the invoked method name.
    #[inline]
    pub fn method(&self) -> &'a str {
        self.method
    }
}

/// A fragment wrapping a method call.
pub trait Concern: Send + Sync {
    /// Process the call, usually by running `next` with the same or
    /// transformed arguments.
    fn invoke(
        &self,
        call: MethodCall<'_>,
        state: &mut StateHolder,
        args: &[Value],
        next: Next<'_>,
    ) -> InvocationResult;
}

/// The single primary implementation of a method.
pub trait Mixin: Send + Sync {
    /// Execute the method against the instance state.
    fn invoke(&self, call: MethodCall<'_>, state: &mut StateHolder, args: &[Value])
        -> InvocationResult;
}

/// A fragment invoked after the mixin returns.
pub trait SideEffect: Send + Sync {
    /// Observe the finished call. The returned value is discarded; an `Err`
    /// is logged and never propagated.
    fn invoke(
        &self,
        call: MethodCall<'_>,
        state: &StateHolder,
        args: &[Value],
        outcome: &InvocationResult,
    ) -> Result<(), crate::dispatch::InvocationError>;
}

/// The remainder of a fragment chain.
///
/// Consumed by value: a concern either runs it once or short-circuits.
pub struct Next<'a> {
    concerns: &'a [Arc<dyn Concern>],
    mixin: &'a Arc<dyn Mixin>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(concerns: &'a [Arc<dyn Concern>], mixin: &'a Arc<dyn Mixin>) -> Self {
        Self { concerns, mixin }
    }

    /// Run the next concern, or the mixin at the end of the chain.
    pub fn run(self, call: MethodCall<'_>, state: &mut StateHolder, args: &[Value]) -> InvocationResult {
        if let Some((first, rest)) = self.concerns.split_first() {
            let next = Next {
                concerns: rest,
                mixin: self.mixin,
            };
            first.invoke(call, state, args, next)
        } else {
            self.mixin.invoke(call, state, args)
        }
    }
}

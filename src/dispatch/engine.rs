//! Chain execution
//!
//! The chain is resolved once at model-build time; this module only replays
//! it. A side-effect failure is logged at WARN and discarded, so the
//! caller's outcome is exactly what the concern/mixin stage produced.

use serde_json::Value;

use crate::model::composite::FragmentChain;
use crate::model::fragment::{MethodCall, Next};
use crate::observability::{Event, Logger};
use crate::state::StateHolder;

use super::InvocationResult;

pub(crate) fn run_chain(
    composite: &str,
    chain: &FragmentChain,
    state: &mut StateHolder,
    args: &[Value],
) -> InvocationResult {
    let call = MethodCall::new(composite, chain.method());
    let outcome = Next::new(chain.concerns(), chain.mixin()).run(call, state, args);

    for side_effect in chain.side_effects() {
        if let Err(error) = side_effect.invoke(call, state, args, &outcome) {
            let message = error.to_string();
            Logger::warn(
                Event::SideEffectFailed.as_str(),
                &[
                    ("composite", composite),
                    ("method", chain.method()),
                    ("error", message.as_str()),
                ],
            );
        }
    }

    outcome
}

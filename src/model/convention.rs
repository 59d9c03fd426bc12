//! Generic convention mixin
//!
//! A reusable predicate/mixin pair that maps method-name patterns onto
//! state-holder access:
//!
//! - `get`/`is`/`has` prefix: scalar read
//! - `set` prefix: scalar write
//! - `add`/`remove` prefix: list mutation
//! - `Iterator` suffix, or the bare name `iterator`: read-only iteration
//!
//! The property name is the method name with the matched prefix/suffix
//! removed and its first letter lower-cased. A stripped prefix must be
//! followed by an uppercase letter, so `settle` is not a write to `tle`.

use std::collections::BTreeSet;

use serde_json::Value;

use super::fragment::{MethodCall, Mixin};
use crate::dispatch::{InvocationError, InvocationResult};
use crate::state::StateHolder;

/// The fixed iteration suffix.
pub const ITERATOR_SUFFIX: &str = "Iterator";

/// Predicate accepting every method name the convention understands.
pub fn applies(method: &str, _capabilities: &BTreeSet<String>) -> bool {
    PropertyAccess::parse(method).is_some()
}

/// The access a convention method name resolves to.
pub(crate) enum PropertyAccess {
    Read(String),
    Write(String),
    Add(String),
    Remove(String),
    Iterate(String),
}

impl PropertyAccess {
    pub(crate) fn parse(method: &str) -> Option<Self> {
        for prefix in ["get", "is", "has"] {
            if let Some(property) = strip_prefixed(method, prefix) {
                return Some(Self::Read(property));
            }
        }
        if let Some(property) = strip_prefixed(method, "set") {
            return Some(Self::Write(property));
        }
        if let Some(property) = strip_prefixed(method, "add") {
            return Some(Self::Add(property));
        }
        if let Some(property) = strip_prefixed(method, "remove") {
            return Some(Self::Remove(property));
        }
        if method == "iterator" {
            // The bare name addresses the anonymous list property.
            return Some(Self::Iterate(String::new()));
        }
        if let Some(rest) = method.strip_suffix(ITERATOR_SUFFIX) {
            if !rest.is_empty() {
                return Some(Self::Iterate(decapitalize(rest)));
            }
        }
        None
    }
}

fn strip_prefixed(method: &str, prefix: &str) -> Option<String> {
    let rest = method.strip_prefix(prefix)?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(decapitalize(rest))
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Mixin resolving convention method names against the state holder.
pub struct ConventionMixin;

impl Mixin for ConventionMixin {
    fn invoke(
        &self,
        call: MethodCall<'_>,
        state: &mut StateHolder,
        args: &[Value],
    ) -> InvocationResult {
        let access = PropertyAccess::parse(call.method()).ok_or_else(|| {
            InvocationError::failed(
                call.method(),
                "method name matches no property convention",
            )
        })?;

        match access {
            PropertyAccess::Read(property) => {
                Ok(state.get(&property).cloned().unwrap_or(Value::Null))
            }
            PropertyAccess::Write(property) => {
                let value = first_arg(call, args)?;
                state.set(&property, value);
                Ok(Value::Null)
            }
            PropertyAccess::Add(property) => {
                let value = first_arg(call, args)?;
                state.add(&property, value);
                Ok(Value::Null)
            }
            PropertyAccess::Remove(property) => {
                let value = first_arg(call, args)?;
                Ok(Value::Bool(state.remove(&property, &value)))
            }
            PropertyAccess::Iterate(property) => {
                Ok(Value::Array(state.list(&property).to_vec()))
            }
        }
    }
}

fn first_arg(call: MethodCall<'_>, args: &[Value]) -> Result<Value, InvocationError> {
    args.first()
        .cloned()
        .ok_or_else(|| InvocationError::invalid_arguments(call.method(), "one value argument"))
}

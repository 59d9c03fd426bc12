//! CompositeModel - Immutable per-type dispatch table
//!
//! Built once by `ModelBuilder`, shared by every instance of the type.
//! Each declared method resolves to a fixed `FragmentChain`; calls replay
//! the chain with no further predicate evaluation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use super::capability::Capability;
use super::fragment::{Concern, Mixin, SideEffect};
use crate::dispatch::{self, InvocationError, InvocationResult};
use crate::state::StateHolder;

/// Dense per-model method index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(u32);

impl MethodId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the arena index of this method.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The resolved dispatch chain for one method.
pub struct FragmentChain {
    method: String,
    declared_in: BTreeSet<String>,
    concerns: Vec<Arc<dyn Concern>>,
    mixin: Arc<dyn Mixin>,
    side_effects: Vec<Arc<dyn SideEffect>>,
}

impl FragmentChain {
    pub(crate) fn new(
        method: String,
        declared_in: BTreeSet<String>,
        concerns: Vec<Arc<dyn Concern>>,
        mixin: Arc<dyn Mixin>,
        side_effects: Vec<Arc<dyn SideEffect>>,
    ) -> Self {
        Self {
            method,
            declared_in,
            concerns,
            mixin,
            side_effects,
        }
    }

    /// Returns the method name this chain serves.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the capabilities declaring this method.
    #[inline]
    pub fn declared_in(&self) -> &BTreeSet<String> {
        &self.declared_in
    }

    /// Returns the wrapping concerns in execution order.
    #[inline]
    pub fn concerns(&self) -> &[Arc<dyn Concern>] {
        &self.concerns
    }

    /// Returns the selected mixin.
    #[inline]
    pub fn mixin(&self) -> &Arc<dyn Mixin> {
        &self.mixin
    }

    /// Returns the side-effects in execution order.
    #[inline]
    pub fn side_effects(&self) -> &[Arc<dyn SideEffect>] {
        &self.side_effects
    }

    /// Iterates the chain in execution order as tagged fragment references.
    pub fn fragments(&self) -> impl Iterator<Item = FragmentRef<'_>> + '_ {
        self.concerns
            .iter()
            .map(|c| FragmentRef::Concern(c.as_ref()))
            .chain(std::iter::once(FragmentRef::Mixin(self.mixin.as_ref())))
            .chain(
                self.side_effects
                    .iter()
                    .map(|s| FragmentRef::SideEffect(s.as_ref())),
            )
    }
}

/// A tagged reference into a fragment chain, for introspection.
pub enum FragmentRef<'a> {
    Concern(&'a dyn Concern),
    Mixin(&'a dyn Mixin),
    SideEffect(&'a dyn SideEffect),
}

impl FragmentRef<'_> {
    /// Returns the fragment role as a stable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Concern(_) => "concern",
            Self::Mixin(_) => "mixin",
            Self::SideEffect(_) => "side-effect",
        }
    }
}

/// Immutable dispatch table for one composite type.
pub struct CompositeModel {
    type_name: String,
    capabilities: Vec<Capability>,
    method_ids: BTreeMap<String, MethodId>,
    chains: Vec<FragmentChain>,
}

impl std::fmt::Debug for CompositeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeModel")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl CompositeModel {
    pub(crate) fn new(
        type_name: String,
        capabilities: Vec<Capability>,
        method_ids: BTreeMap<String, MethodId>,
        chains: Vec<FragmentChain>,
    ) -> Self {
        Self {
            type_name,
            capabilities,
            method_ids,
            chains,
        }
    }

    /// Returns the composite type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the declared capabilities.
    #[inline]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns the method id for `method`, if declared.
    pub fn method_id(&self, method: &str) -> Option<MethodId> {
        self.method_ids.get(method).copied()
    }

    /// Returns the chain at `id`.
    ///
    /// Ids are only minted by the builder, so an id from this model always
    /// resolves.
    pub fn chain(&self, id: MethodId) -> &FragmentChain {
        &self.chains[id.index()]
    }

    /// Returns the chain for `method`, if declared.
    pub fn chain_for(&self, method: &str) -> Option<&FragmentChain> {
        self.method_id(method).map(|id| self.chain(id))
    }

    /// Returns the number of declared methods.
    #[inline]
    pub fn method_count(&self) -> usize {
        self.chains.len()
    }

    /// Execute `method` against `state`.
    ///
    /// Concerns run outermost-first, then the selected mixin, then the
    /// side-effects. Side-effect failures are logged, never propagated.
    pub fn invoke(
        &self,
        method: &str,
        state: &mut StateHolder,
        args: &[Value],
    ) -> InvocationResult {
        let chain = self
            .chain_for(method)
            .ok_or_else(|| InvocationError::unknown_method(&self.type_name, method))?;
        dispatch::run_chain(&self.type_name, chain, state, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capability, ConventionMixin, ModelBuilder};
    use serde_json::json;

    fn sample_model() -> CompositeModel {
        ModelBuilder::new("Sample")
            .capability(Capability::new("Named").method("getName").method("setName"))
            .mixin(crate::model::convention::applies, ConventionMixin)
            .build()
            .unwrap()
    }

    #[test]
    fn test_method_ids_are_dense_and_resolvable() {
        let model = sample_model();
        assert_eq!(model.method_count(), 2);
        let id = model.method_id("getName").unwrap();
        assert_eq!(model.chain(id).method(), "getName");
        assert!(model.method_id("unknown").is_none());
    }

    #[test]
    fn test_unknown_method_fails_invocation() {
        let model = sample_model();
        let mut state = StateHolder::new();
        let err = model.invoke("frobnicate", &mut state, &[]).unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_chain_iteration_is_tagged_and_ordered() {
        let model = sample_model();
        let chain = model.chain_for("getName").unwrap();
        let kinds: Vec<_> = chain.fragments().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["mixin"]);
    }

    #[test]
    fn test_invoke_round_trips_through_convention() {
        let model = sample_model();
        let mut state = StateHolder::new();
        model
            .invoke("setName", &mut state, &[json!("Ada")])
            .unwrap();
        let name = model.invoke("getName", &mut state, &[]).unwrap();
        assert_eq!(name, json!("Ada"));
    }
}

//! ModelBuilder - Build-time assembly of a composite model
//!
//! Fragments register together with an applicability predicate over
//! (method name, declaring capability set). Predicates are evaluated once
//! per method here; calls never re-evaluate them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::capability::Capability;
use super::composite::{CompositeModel, FragmentChain, MethodId};
use super::errors::ModelBuildError;
use super::fragment::{Concern, Mixin, SideEffect};

/// Applicability predicate over (method name, declaring capability set).
pub type AppliesTo = dyn Fn(&str, &BTreeSet<String>) -> bool + Send + Sync;

/// Builder for one composite type's dispatch table.
pub struct ModelBuilder {
    type_name: String,
    capabilities: Vec<Capability>,
    concerns: Vec<(Box<AppliesTo>, Arc<dyn Concern>)>,
    mixins: Vec<(Box<AppliesTo>, Arc<dyn Mixin>)>,
    side_effects: Vec<(Box<AppliesTo>, Arc<dyn SideEffect>)>,
}

impl ModelBuilder {
    /// Start a builder for the named composite type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            capabilities: Vec::new(),
            concerns: Vec::new(),
            mixins: Vec::new(),
            side_effects: Vec::new(),
        }
    }

    /// Declare a capability of this type.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Register a concern for every method its predicate accepts.
    pub fn concern<P, C>(mut self, applies: P, concern: C) -> Self
    where
        P: Fn(&str, &BTreeSet<String>) -> bool + Send + Sync + 'static,
        C: Concern + 'static,
    {
        self.concerns.push((Box::new(applies), Arc::new(concern)));
        self
    }

    /// Register a mixin candidate. The first registered predicate that
    /// accepts a method provides its implementation.
    pub fn mixin<P, M>(mut self, applies: P, mixin: M) -> Self
    where
        P: Fn(&str, &BTreeSet<String>) -> bool + Send + Sync + 'static,
        M: Mixin + 'static,
    {
        self.mixins.push((Box::new(applies), Arc::new(mixin)));
        self
    }

    /// Register a side-effect for every method its predicate accepts.
    pub fn side_effect<P, S>(mut self, applies: P, side_effect: S) -> Self
    where
        P: Fn(&str, &BTreeSet<String>) -> bool + Send + Sync + 'static,
        S: SideEffect + 'static,
    {
        self.side_effects.push((Box::new(applies), Arc::new(side_effect)));
        self
    }

    /// Resolve every declared method to a fragment chain.
    ///
    /// Fails with `ModelBuildError::NoApplicableMixin` if any method matches
    /// no mixin predicate. This is the only place that error can surface;
    /// calls against a built model cannot hit it.
    pub fn build(self) -> Result<CompositeModel, ModelBuildError> {
        // Collect declared methods in declaration order, merging the
        // declaring capability sets of duplicate names.
        let mut order: Vec<String> = Vec::new();
        let mut declared: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for capability in &self.capabilities {
            for method in capability.methods() {
                declared
                    .entry(method.clone())
                    .or_insert_with(|| {
                        order.push(method.clone());
                        BTreeSet::new()
                    })
                    .insert(capability.name().to_string());
            }
        }

        let mut method_ids = BTreeMap::new();
        let mut chains = Vec::with_capacity(order.len());
        for method in order {
            let declaring = declared
                .remove(&method)
                .unwrap_or_default();

            let mixin = self
                .mixins
                .iter()
                .find(|(applies, _)| applies(&method, &declaring))
                .map(|(_, mixin)| Arc::clone(mixin))
                .ok_or_else(|| ModelBuildError::NoApplicableMixin {
                    composite: self.type_name.clone(),
                    method: method.clone(),
                })?;

            let concerns: Vec<Arc<dyn Concern>> = self
                .concerns
                .iter()
                .filter(|(applies, _)| applies(&method, &declaring))
                .map(|(_, concern)| Arc::clone(concern))
                .collect();

            let side_effects: Vec<Arc<dyn SideEffect>> = self
                .side_effects
                .iter()
                .filter(|(applies, _)| applies(&method, &declaring))
                .map(|(_, side_effect)| Arc::clone(side_effect))
                .collect();

            method_ids.insert(method.clone(), MethodId::new(chains.len()));
            chains.push(FragmentChain::new(
                method,
                declaring,
                concerns,
                mixin,
                side_effects,
            ));
        }

        Ok(CompositeModel::new(
            self.type_name,
            self.capabilities,
            method_ids,
            chains,
        ))
    }
}

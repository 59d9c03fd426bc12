//! # Composite Model
//!
//! Per-type dispatch tables built once at application-model-build time.
//!
//! ## Design Principles
//!
//! - Explicit registration of predicate/fragment pairs, no reflection
//! - First matching mixin predicate wins; all matching concerns and
//!   side-effects apply in declaration order
//! - A method with no applicable mixin fails the build, never a call

pub mod builder;
pub mod capability;
pub mod composite;
pub mod convention;
pub mod errors;
pub mod fragment;
pub mod registry;

pub use builder::ModelBuilder;
pub use capability::Capability;
pub use composite::{CompositeModel, FragmentChain, FragmentRef, MethodId};
pub use convention::{ConventionMixin, ITERATOR_SUFFIX};
pub use errors::ModelBuildError;
pub use fragment::{Concern, MethodCall, Mixin, Next, SideEffect};
pub use registry::{ModelRegistry, TypeId};

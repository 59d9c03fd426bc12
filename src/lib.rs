//! quilt - A deterministic composite method-dispatch engine with
//! transactional entity state
//!
//! quilt composes an object's behavior from independently authored
//! fragments (wrapping concerns, one primary mixin, post-call
//! side-effects) and runs entity mutations inside a unit of work with
//! optimistic concurrency against a pluggable entity store.
//!
//! # Structure
//!
//! - [`model`] - per-type dispatch tables, built once and replayed on
//!   every call
//! - [`dispatch`] - the synchronous fragment chain walker
//! - [`state`] - in-memory value and association storage
//! - [`entity`] - versioned entity state and live instances
//! - [`uow`] - transaction scopes, nesting, completion protocol, change
//!   feed
//! - [`store`] - the storage backend contract and the in-memory
//!   reference store
//! - [`observability`] - structured, deterministic JSON logging

pub mod dispatch;
pub mod entity;
pub mod model;
pub mod observability;
pub mod state;
pub mod store;
pub mod uow;

pub use dispatch::{InvocationError, InvocationResult};
pub use entity::{CompositeInstance, EntityHandle, EntityInstance, EntityState, EntityStatus};
pub use model::{
    Capability, CompositeModel, ConventionMixin, MethodCall, ModelBuildError, ModelBuilder,
    ModelRegistry, Next, TypeId,
};
pub use state::{EntityReference, StateHolder};
pub use store::{EntityStore, EntityStoreError, MemoryEntityStore, StateCommitter};
pub use uow::{
    CallbackError, ChangeObserver, ChangeSet, CurrentScope, UnitOfWork, UnitOfWorkCallback,
    UnitOfWorkError, UnitOfWorkFactory, UnitOfWorkStatus,
};

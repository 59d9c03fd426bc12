//! Entity store error types

use thiserror::Error;

use crate::state::EntityReference;

/// Failures surfaced by entity store implementations.
#[derive(Debug, Error)]
pub enum EntityStoreError {
    /// The identity is absent or already removed.
    #[error("entity not found: `{0}`")]
    NotFound(EntityReference),

    /// The identity is already durable.
    #[error("entity already exists: `{0}`")]
    AlreadyExists(EntityReference),

    /// A changed state was prepared against a stale version.
    ///
    /// The caller must retry in a fresh unit of work.
    #[error("concurrent modification of `{identity}`: prepared against version {expected}, store has {actual}")]
    ConcurrentModification {
        identity: EntityReference,
        expected: u64,
        actual: u64,
    },

    /// An I/O failure in the backend.
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A state could not be serialized or deserialized.
    #[error("state serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-internal failure (lock poisoning, connection loss).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

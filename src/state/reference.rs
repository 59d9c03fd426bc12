//! EntityReference - Typed entity identity
//!
//! Identity is unique per store. References are plain strings under the
//! hood so any backend can key on them directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity of one entity.
///
/// References are cheap to clone and totally ordered, so they can key the
/// tracked-instance map of a unit of work as well as a durable store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityReference(String);

impl EntityReference {
    /// Creates a reference from an explicit identity string.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Generates a fresh random identity.
    ///
    /// Used when an entity is created without a caller-supplied identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identity string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityReference {
    fn from(identity: &str) -> Self {
        Self(identity.to_string())
    }
}

impl From<String> for EntityReference {
    fn from(identity: String) -> Self {
        Self(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_round_trip() {
        let reference = EntityReference::new("order-17");
        assert_eq!(reference.as_str(), "order-17");
        assert_eq!(reference.to_string(), "order-17");
    }

    #[test]
    fn test_generated_references_are_distinct() {
        assert_ne!(EntityReference::generate(), EntityReference::generate());
    }

    #[test]
    fn test_reference_ordering_is_stable() {
        let a = EntityReference::new("a");
        let b = EntityReference::new("b");
        assert!(a < b);
    }
}

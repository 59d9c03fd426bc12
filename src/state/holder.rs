//! StateHolder - Named values and associations for one instance
//!
//! Scalar and list values for the same property name live under disjoint
//! key namespaces (fixed prefixes), so `set("foo", v)` and `add("foo", x)`
//! can never collide. Associations are kept apart from property values:
//! a single-reference map and an ordered many-reference map.
//!
//! Every write bumps a mutation counter. Callers that need dirty tracking
//! (entity instances) compare the counter around a dispatch instead of
//! hooking each accessor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EntityReference;

/// Key prefix for scalar property values.
pub const SCALAR_PREFIX: &str = "p:";

/// Key prefix for list property values.
pub const LIST_PREFIX: &str = "l:";

/// In-memory container of named values and references for one instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHolder {
    /// Property values, keyed by prefixed name (`p:` scalars, `l:` lists).
    values: BTreeMap<String, Value>,
    /// Single associations, keyed by association name.
    associations: BTreeMap<String, EntityReference>,
    /// Ordered many-associations, keyed by association name.
    many_associations: BTreeMap<String, Vec<EntityReference>>,
    /// Monotonic write counter, not persisted.
    #[serde(skip)]
    mutations: u64,
}

impl StateHolder {
    /// Creates an empty state holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scalar value for `name`, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&scalar_key(name))
    }

    /// Sets the scalar value for `name`.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(scalar_key(name), value);
        self.mutations += 1;
    }

    /// Appends a value to the list stored under `name`.
    pub fn add(&mut self, name: &str, value: Value) {
        let entry = self
            .values
            .entry(list_key(name))
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(value);
        }
        self.mutations += 1;
    }

    /// Removes the first occurrence of `value` from the list under `name`.
    ///
    /// Returns true if a value was removed.
    pub fn remove(&mut self, name: &str, value: &Value) -> bool {
        let removed = match self.values.get_mut(&list_key(name)) {
            Some(Value::Array(items)) => match items.iter().position(|item| item == value) {
                Some(index) => {
                    items.remove(index);
                    true
                }
                None => false,
            },
            _ => false,
        };
        if removed {
            self.mutations += 1;
        }
        removed
    }

    /// Returns the list stored under `name`, empty if absent.
    pub fn list(&self, name: &str) -> &[Value] {
        match self.values.get(&list_key(name)) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Returns the single association for `name`, if set.
    pub fn association(&self, name: &str) -> Option<&EntityReference> {
        self.associations.get(name)
    }

    /// Sets or clears the single association for `name`.
    pub fn set_association(&mut self, name: &str, target: Option<EntityReference>) {
        match target {
            Some(reference) => {
                self.associations.insert(name.to_string(), reference);
            }
            None => {
                self.associations.remove(name);
            }
        }
        self.mutations += 1;
    }

    /// Returns the ordered many-association for `name`, empty if absent.
    pub fn many_association(&self, name: &str) -> &[EntityReference] {
        self.many_associations
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends a reference to the many-association under `name`.
    pub fn add_association(&mut self, name: &str, target: EntityReference) {
        self.many_associations
            .entry(name.to_string())
            .or_default()
            .push(target);
        self.mutations += 1;
    }

    /// Removes the first occurrence of `target` from the many-association.
    ///
    /// Returns true if a reference was removed.
    pub fn remove_association(&mut self, name: &str, target: &EntityReference) -> bool {
        let removed = match self.many_associations.get_mut(name) {
            Some(targets) => match targets.iter().position(|t| t == target) {
                Some(index) => {
                    targets.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };
        if removed {
            self.mutations += 1;
        }
        removed
    }

    /// Returns the number of writes applied to this holder.
    #[inline]
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }
}

fn scalar_key(name: &str) -> String {
    format!("{}{}", SCALAR_PREFIX, name)
}

fn list_key(name: &str) -> String {
    format!("{}{}", LIST_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_round_trip() {
        let mut state = StateHolder::new();
        state.set("name", json!("Ada"));
        assert_eq!(state.get("name"), Some(&json!("Ada")));
    }

    #[test]
    fn test_scalar_and_list_namespaces_are_disjoint() {
        let mut state = StateHolder::new();
        state.set("tag", json!("scalar"));
        state.add("tag", json!("first"));

        assert_eq!(state.get("tag"), Some(&json!("scalar")));
        assert_eq!(state.list("tag"), &[json!("first")]);

        state.add("tag", json!("second"));
        assert_eq!(state.get("tag"), Some(&json!("scalar")));
        assert_eq!(state.list("tag").len(), 2);
    }

    #[test]
    fn test_list_remove_first_occurrence_only() {
        let mut state = StateHolder::new();
        state.add("xs", json!(1));
        state.add("xs", json!(2));
        state.add("xs", json!(1));

        assert!(state.remove("xs", &json!(1)));
        assert_eq!(state.list("xs"), &[json!(2), json!(1)]);
        assert!(!state.remove("xs", &json!(9)));
    }

    #[test]
    fn test_association_round_trip() {
        let mut state = StateHolder::new();
        state.set_association("owner", Some(EntityReference::new("user-1")));
        assert_eq!(
            state.association("owner"),
            Some(&EntityReference::new("user-1"))
        );

        state.set_association("owner", None);
        assert_eq!(state.association("owner"), None);
    }

    #[test]
    fn test_many_association_preserves_order() {
        let mut state = StateHolder::new();
        state.add_association("items", EntityReference::new("b"));
        state.add_association("items", EntityReference::new("a"));

        let items = state.many_association("items");
        assert_eq!(items[0].as_str(), "b");
        assert_eq!(items[1].as_str(), "a");

        assert!(state.remove_association("items", &EntityReference::new("b")));
        assert_eq!(state.many_association("items").len(), 1);
    }

    #[test]
    fn test_mutation_counter_tracks_writes() {
        let mut state = StateHolder::new();
        assert_eq!(state.mutation_count(), 0);

        state.set("a", json!(1));
        state.add("b", json!(2));
        assert_eq!(state.mutation_count(), 2);

        // A failed list removal is not a write.
        assert!(!state.remove("b", &json!(3)));
        assert_eq!(state.mutation_count(), 2);
    }

    #[test]
    fn test_serde_round_trip_skips_counter() {
        let mut state = StateHolder::new();
        state.set("n", json!(42));
        state.add_association("refs", EntityReference::new("x"));

        let encoded = serde_json::to_string(&state).unwrap();
        let decoded: StateHolder = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.get("n"), Some(&json!(42)));
        assert_eq!(decoded.many_association("refs").len(), 1);
        assert_eq!(decoded.mutation_count(), 0);
    }
}

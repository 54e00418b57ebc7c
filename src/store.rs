//! The per-session attribute store.
//!
//! Maps attribute names to the set of values accumulated during one
//! elicitation run. The store only grows, except for wholesale replacement
//! by production-rule consequences and yes/no answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::AttrValue;

/// Accumulated attribute values for one session.
///
/// Values are kept as a deduplicated, insertion-ordered list per attribute
/// (range markers carry `f64` thresholds, which rules out hashing). Iteration
/// over attributes is ordered by name, so downstream passes are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore {
    entries: BTreeMap<String, Vec<AttrValue>>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently unions `value` into the attribute's set, creating the
    /// set if absent.
    pub fn add(&mut self, attribute: impl Into<String>, value: AttrValue) {
        let values = self.entries.entry(attribute.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Replaces the attribute's set with exactly `{value}`.
    ///
    /// Used by production-rule consequences and yes/no answers; elicited
    /// choice answers accumulate via [`AttributeStore::add`] instead.
    pub fn set(&mut self, attribute: impl Into<String>, value: AttrValue) {
        self.entries.insert(attribute.into(), vec![value]);
    }

    /// Returns the recorded values for an attribute, empty when unrecorded.
    #[must_use]
    pub fn get(&self, attribute: &str) -> &[AttrValue] {
        self.entries.get(attribute).map_or(&[], Vec::as_slice)
    }

    /// Returns true if the attribute has any recorded value.
    #[must_use]
    pub fn contains_attribute(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    /// Returns true if `value` is recorded for the attribute.
    #[must_use]
    pub fn contains(&self, attribute: &str, value: &AttrValue) -> bool {
        self.get(attribute).contains(value)
    }

    /// Number of attributes with at least one recorded value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates attributes and their value sets in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttrValue])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_creates_and_unions() {
        let mut store = AttributeStore::new();
        assert!(store.is_empty());

        store.add("switch_type", AttrValue::from("mechanical"));
        store.add("switch_type", AttrValue::from("membrane"));
        assert_eq!(store.get("switch_type").len(), 2);
        assert!(store.contains("switch_type", &AttrValue::from("mechanical")));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = AttributeStore::new();
        store.add("wireless", AttrValue::Bool(true));
        store.add("wireless", AttrValue::Bool(true));
        assert_eq!(store.get("wireless"), &[AttrValue::Bool(true)]);
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let mut store = AttributeStore::new();
        store.add("priority", AttrValue::from("speed"));
        store.add("priority", AttrValue::from("comfort"));
        assert_eq!(store.get("priority").len(), 2);

        store.set("priority", AttrValue::from("silence"));
        assert_eq!(store.get("priority"), &[AttrValue::from("silence")]);
    }

    #[test]
    fn test_get_unrecorded_is_empty() {
        let store = AttributeStore::new();
        assert!(store.get("missing").is_empty());
        assert!(!store.contains_attribute("missing"));
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let mut store = AttributeStore::new();
        store.add("b", AttrValue::Number(2.0));
        store.add("a", AttrValue::Number(1.0));
        let names: Vec<&str> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_range_markers_dedup_by_value() {
        let mut store = AttributeStore::new();
        store.add("price", AttrValue::at_most(500.0));
        store.add("price", AttrValue::at_most(500.0));
        store.add("price", AttrValue::at_least(500.0));
        assert_eq!(store.get("price").len(), 2);
    }
}

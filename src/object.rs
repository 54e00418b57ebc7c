//! Catalog objects and the final filtering pass.
//!
//! The filter inverts the question/rule direction: the object's declared
//! attributes are the subject and the store's accumulated values are the
//! constraint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::store::AttributeStore;
use crate::value::{AttrValue, RangeDirection};

/// One candidate item in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    /// Unique object name; result ordering follows catalog order.
    pub name: String,
    /// Declared attribute values, one concrete value per attribute.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl CatalogObject {
    /// Creates an object with no declared attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Declares an attribute value.
    #[must_use]
    pub fn with_attribute(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// Tests this object against the accumulated constraints.
    ///
    /// An attribute unconstrained in the store imposes nothing. A stored
    /// at-least marker rejects when the object's numeric value is below the
    /// threshold, an at-most marker when above; an object value with no
    /// numeric form cannot satisfy a range constraint. A non-range check
    /// rejects only when the object declares boolean false and `false` is
    /// absent from the stored values.
    #[must_use]
    pub fn matches(&self, store: &AttributeStore) -> bool {
        for (attribute, declared) in &self.attributes {
            let constraints = store.get(attribute);
            for constraint in constraints {
                match constraint {
                    AttrValue::Range {
                        direction,
                        threshold,
                    } => {
                        let Some(value) = declared.as_number() else {
                            trace!(object = %self.name, %attribute, "non-numeric value under range constraint");
                            return false;
                        };
                        let rejected = match direction {
                            RangeDirection::AtLeast => value < *threshold,
                            RangeDirection::AtMost => value > *threshold,
                        };
                        if rejected {
                            trace!(object = %self.name, %attribute, %constraint, "range constraint violated");
                            return false;
                        }
                    }
                    _ => {
                        if matches!(declared, AttrValue::Bool(false))
                            && !constraints.contains(&AttrValue::Bool(false))
                        {
                            trace!(object = %self.name, %attribute, "object lacks a required feature");
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Filters the catalog against the store, preserving catalog order.
#[must_use]
pub fn filter_catalog<'a>(
    catalog: &'a [CatalogObject],
    store: &AttributeStore,
) -> Vec<&'a CatalogObject> {
    catalog.iter().filter(|object| object.matches(store)).collect()
}

//! Condition shapes tested against the attribute store.
//!
//! One condition constrains one attribute. The same semantics gate static
//! rules and (through the store) downstream passes: an attribute with no
//! recorded value satisfies nothing.

use serde::{Deserialize, Serialize};

use crate::store::AttributeStore;
use crate::value::{AttrValue, RangeDirection};

/// A declared condition over a single attribute.
///
/// In configuration JSON an array reads as [`Condition::AnyOf`] and any
/// scalar as [`Condition::Is`]; range-token strings inside either form are
/// folded into [`AttrValue::Range`] at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Satisfied when at least one candidate is among the recorded values.
    AnyOf(Vec<AttrValue>),
    /// Satisfied when the value (or, for ranges, the threshold relation)
    /// holds against the recorded values.
    Is(AttrValue),
}

impl Condition {
    /// Folds range tokens in the condition's values; applied once at load.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::AnyOf(values) => {
                Self::AnyOf(values.into_iter().map(AttrValue::normalized).collect())
            }
            Self::Is(value) => Self::Is(value.normalized()),
        }
    }

    /// Tests this condition against the values recorded for `attribute`.
    ///
    /// An attribute with no recorded value is unsatisfied for every
    /// condition shape. A range condition requires a recorded range marker
    /// whose threshold meets the condition's cutoff; the recorded marker's
    /// own direction is not consulted. A candidate list is satisfied by any
    /// overlap with the recorded set, and a scalar by plain membership.
    #[must_use]
    pub fn matches(&self, store: &AttributeStore, attribute: &str) -> bool {
        let recorded = store.get(attribute);
        if recorded.is_empty() {
            return false;
        }
        match self {
            Self::Is(AttrValue::Range {
                direction,
                threshold,
            }) => recorded.iter().any(|value| match value {
                AttrValue::Range {
                    threshold: stored, ..
                } => match direction {
                    RangeDirection::AtLeast => stored >= threshold,
                    RangeDirection::AtMost => stored <= threshold,
                },
                _ => false,
            }),
            Self::AnyOf(candidates) => candidates.iter().any(|c| recorded.contains(c)),
            Self::Is(value) => recorded.contains(value),
        }
    }
}

impl From<AttrValue> for Condition {
    fn from(value: AttrValue) -> Self {
        Self::Is(value)
    }
}

impl From<Vec<AttrValue>> for Condition {
    fn from(values: Vec<AttrValue>) -> Self {
        Self::AnyOf(values)
    }
}

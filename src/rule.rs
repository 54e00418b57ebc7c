//! Static rules steering the question flow.
//!
//! A rule tests attribute conditions against the store and, on a full
//! match, includes and/or skips future questions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::question::QuestionId;
use crate::store::AttributeStore;

/// Identifier of a static rule in the loaded configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RuleId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A static question-flow rule.
///
/// All attribute conditions must hold for the rule to match (logical AND).
/// On match, `include` ids join the remaining-question set and `skip` ids
/// join the excluded set; exclusion wins at reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Attribute conditions, all of which must hold.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Condition>,
    /// Legacy key folded into `attributes` during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, Condition>>,
    /// Question ids pulled into the remaining set on match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<QuestionId>,
    /// Question ids excluded from asking on match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip: Vec<QuestionId>,
}

impl Rule {
    /// Creates a rule with no conditions or effects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            parameters: None,
            include: Vec::new(),
            skip: Vec::new(),
        }
    }

    /// Adds an attribute condition.
    #[must_use]
    pub fn when(mut self, attribute: impl Into<String>, condition: impl Into<Condition>) -> Self {
        self.attributes.insert(attribute.into(), condition.into());
        self
    }

    /// Adds question ids to include on match.
    #[must_use]
    pub fn includes(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.include.extend(ids.into_iter().map(QuestionId));
        self
    }

    /// Adds question ids to skip on match.
    #[must_use]
    pub fn skips(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.skip.extend(ids.into_iter().map(QuestionId));
        self
    }

    /// Folds the legacy `parameters` key and any range tokens in the
    /// conditions. Applied once before the first question is asked.
    pub fn normalize(&mut self) {
        if let Some(parameters) = self.parameters.take() {
            self.attributes = parameters;
        }
        let attributes = std::mem::take(&mut self.attributes);
        self.attributes = attributes
            .into_iter()
            .map(|(attribute, condition)| (attribute, condition.normalized()))
            .collect();
    }

    /// Tests whether every attribute condition holds against the store.
    #[must_use]
    pub fn matches(&self, store: &AttributeStore) -> bool {
        self.attributes
            .iter()
            .all(|(attribute, condition)| condition.matches(store, attribute))
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new()
    }
}

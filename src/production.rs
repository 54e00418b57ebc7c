//! Production rules deriving attributes from already-known ones.
//!
//! Production rules run in a single forward pass after elicitation ends,
//! in declared order, each exactly once. A matching rule's consequence
//! replaces the target attribute's value set wholesale.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::AttributeStore;
use crate::value::{AttrValue, RangeDirection};

/// Composition operator over a production rule's premise clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PremiseOperator {
    /// All clauses must hold.
    #[default]
    And,
    /// At least one clause must hold.
    Or,
}

impl fmt::Display for PremiseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// A production rule: premise clauses, an operator, and a consequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    /// Rule identifier, for logs and authoring.
    pub id: String,
    /// Premise: attribute name to comparison value.
    pub premise: BTreeMap<String, AttrValue>,
    /// Declared composition operator. A single-clause premise always
    /// composes with AND, whatever is declared.
    #[serde(default)]
    pub operator: PremiseOperator,
    /// Consequence: attribute name to the single value assigned on match.
    pub consequence: BTreeMap<String, AttrValue>,
}

impl ProductionRule {
    /// Creates a rule with the given id and empty premise/consequence.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            premise: BTreeMap::new(),
            operator: PremiseOperator::And,
            consequence: BTreeMap::new(),
        }
    }

    /// Adds a premise clause.
    #[must_use]
    pub fn premise_on(mut self, attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.premise.insert(attribute.into(), value.into());
        self
    }

    /// Sets the declared operator.
    #[must_use]
    pub fn with_operator(mut self, operator: PremiseOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Adds a consequence assignment.
    #[must_use]
    pub fn derives(mut self, attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.consequence.insert(attribute.into(), value.into());
        self
    }

    /// Folds range tokens in premise values. Consequence values are
    /// assigned verbatim, so tokens there stay literal text.
    pub fn normalize(&mut self) {
        let premise = std::mem::take(&mut self.premise);
        self.premise = premise
            .into_iter()
            .map(|(attribute, value)| (attribute, value.normalized()))
            .collect();
    }

    /// The operator actually used: AND for single-clause premises,
    /// the declared operator otherwise.
    #[must_use]
    pub fn effective_operator(&self) -> PremiseOperator {
        if self.premise.len() == 1 {
            PremiseOperator::And
        } else {
            self.operator
        }
    }

    /// Tests the premise against the store.
    #[must_use]
    pub fn matches(&self, store: &AttributeStore) -> bool {
        let mut clauses = self
            .premise
            .iter()
            .map(|(attribute, expected)| clause_holds(store, attribute, expected));
        match self.effective_operator() {
            PremiseOperator::And => clauses.all(|holds| holds),
            PremiseOperator::Or => clauses.any(|holds| holds),
        }
    }

    /// Applies the rule: on a premise match, each consequence pair replaces
    /// the target attribute's value set. Returns whether the rule fired.
    pub fn apply(&self, store: &mut AttributeStore) -> bool {
        if !self.matches(store) {
            return false;
        }
        for (attribute, value) in &self.consequence {
            store.set(attribute.clone(), value.clone());
        }
        true
    }
}

/// One premise clause against the store.
///
/// An absent attribute never holds. Otherwise the clause holds unless a
/// stored range marker fails the numeric comparison (direction read from
/// the stored marker, magnitude from the premise's threshold), or the
/// premise value is boolean false without `false` among the stored values.
fn clause_holds(store: &AttributeStore, attribute: &str, expected: &AttrValue) -> bool {
    let recorded = store.get(attribute);
    if recorded.is_empty() {
        return false;
    }
    for stored in recorded {
        match stored {
            AttrValue::Range {
                direction,
                threshold: stored_threshold,
            } => {
                let Some(required) = expected.threshold() else {
                    return false;
                };
                let holds = match direction {
                    RangeDirection::AtLeast => *stored_threshold >= required,
                    RangeDirection::AtMost => *stored_threshold <= required,
                };
                if !holds {
                    return false;
                }
            }
            _ => {
                if matches!(expected, AttrValue::Bool(false))
                    && !recorded.contains(&AttrValue::Bool(false))
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Runs every production rule once, in declared order, over the store.
/// Returns how many rules fired.
pub fn run_production_pass(rules: &[ProductionRule], store: &mut AttributeStore) -> usize {
    let mut fired = 0;
    for rule in rules {
        if rule.apply(store) {
            debug!(rule = %rule.id, "production rule fired");
            fired += 1;
        }
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clause_forces_and() {
        let rule = ProductionRule::new("r")
            .premise_on("a", AttrValue::from("x"))
            .with_operator(PremiseOperator::Or);
        assert_eq!(rule.effective_operator(), PremiseOperator::And);

        let multi = rule.premise_on("b", AttrValue::from("y"));
        assert_eq!(multi.effective_operator(), PremiseOperator::Or);
    }

    #[test]
    fn test_absent_attribute_fails_clause() {
        let rule = ProductionRule::new("r").premise_on("missing", AttrValue::at_least(1.0));
        assert!(!rule.matches(&AttributeStore::new()));
    }

    #[test]
    fn test_stored_direction_premise_threshold() {
        // Stored at-least marker: holds while its threshold >= the premise's.
        let mut store = AttributeStore::new();
        store.add("count", AttrValue::at_least(2.0));

        let holds = ProductionRule::new("r").premise_on("count", AttrValue::at_least(1.0));
        assert!(holds.matches(&store));

        let fails = ProductionRule::new("r").premise_on("count", AttrValue::at_least(3.0));
        assert!(!fails.matches(&store));

        // Stored at-most marker: the stored direction drives the comparison
        // even against an at-least flavored premise.
        let mut store = AttributeStore::new();
        store.add("price", AttrValue::at_most(100.0));

        let holds = ProductionRule::new("r").premise_on("price", AttrValue::at_least(150.0));
        assert!(holds.matches(&store));

        let fails = ProductionRule::new("r").premise_on("price", AttrValue::at_least(50.0));
        assert!(!fails.matches(&store));
    }

    #[test]
    fn test_range_marker_against_thresholdless_premise_fails() {
        let mut store = AttributeStore::new();
        store.add("count", AttrValue::at_least(2.0));
        let rule = ProductionRule::new("r").premise_on("count", AttrValue::from("some"));
        assert!(!rule.matches(&store));
    }

    #[test]
    fn test_false_premise_needs_false_recorded() {
        let mut store = AttributeStore::new();
        store.add("wireless", AttrValue::Bool(true));
        let rule = ProductionRule::new("r").premise_on("wireless", AttrValue::Bool(false));
        assert!(!rule.matches(&store));

        store.add("wireless", AttrValue::Bool(false));
        assert!(rule.matches(&store));
    }

    #[test]
    fn test_or_composition_with_one_absent_clause() {
        let mut store = AttributeStore::new();
        store.add("a", AttrValue::at_least(2.0));

        let rule = ProductionRule::new("r")
            .premise_on("a", AttrValue::at_least(1.0))
            .premise_on("b", AttrValue::at_least(1.0))
            .with_operator(PremiseOperator::Or)
            .derives("derived", AttrValue::Bool(true));

        assert!(rule.apply(&mut store));
        assert_eq!(store.get("derived"), &[AttrValue::Bool(true)]);
    }

    #[test]
    fn test_consequence_replaces_wholesale() {
        let mut store = AttributeStore::new();
        store.add("category", AttrValue::from("elicited"));
        store.add("category", AttrValue::from("extra"));
        store.add("a", AttrValue::from("x"));

        let first = ProductionRule::new("first")
            .premise_on("a", AttrValue::from("x"))
            .derives("category", AttrValue::from("budget"));
        let second = ProductionRule::new("second")
            .premise_on("a", AttrValue::from("x"))
            .derives("category", AttrValue::from("premium"));

        let fired = run_production_pass(&[first, second], &mut store);
        assert_eq!(fired, 2);
        // Only the last-applied value survives.
        assert_eq!(store.get("category"), &[AttrValue::from("premium")]);
    }

    #[test]
    fn test_declared_order_single_pass() {
        // A rule whose premise is satisfied only by a later rule's
        // consequence does not fire: no fixed-point iteration.
        let mut store = AttributeStore::new();
        store.add("seed", AttrValue::from("yes"));

        let depends = ProductionRule::new("depends")
            .premise_on("derived", AttrValue::from("set"))
            .derives("late", AttrValue::Bool(true));
        let produces = ProductionRule::new("produces")
            .premise_on("seed", AttrValue::from("yes"))
            .derives("derived", AttrValue::from("set"));

        let fired = run_production_pass(&[depends, produces], &mut store);
        assert_eq!(fired, 1);
        assert!(store.get("late").is_empty());
    }

    #[test]
    fn test_production_rule_json() {
        let json = r#"{
            "id": "budget-board",
            "premise": {"price": "100-"},
            "operator": "OR",
            "consequence": {"category": "budget"}
        }"#;
        let mut rule: ProductionRule = serde_json::from_str(json).unwrap();
        rule.normalize();
        assert_eq!(rule.premise["price"], AttrValue::at_most(100.0));
        assert_eq!(rule.consequence["category"], AttrValue::from("budget"));
        // Single clause: declared OR is overridden.
        assert_eq!(rule.effective_operator(), PremiseOperator::And);
    }
}

//! Question records and the typed answers that cross the I/O boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::AttrValue;

/// Identifier of a question in the loaded configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl QuestionId {
    /// Every session starts at question 1.
    pub const ENTRY: Self = Self(1);
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for QuestionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// How a question is asked and how its answer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option is selected.
    SingleChoice,
    /// Zero or more options are selected.
    MultiChoice,
    /// Zero or more options are selected; each chosen option's value names
    /// an attribute that is set to `true`.
    AttributeToggle,
    /// Yes/no answer replacing the bound attribute with a boolean.
    YesNo,
    /// Numeric answer recorded as a range marker on the bound attribute.
    NumericEntry {
        /// When true the answer is an upper bound ("at most"), otherwise a
        /// lower bound ("at least").
        #[serde(default)]
        maximum: bool,
    },
}

impl QuestionKind {
    /// Kinds whose recording requires an attribute binding on the question.
    #[must_use]
    pub const fn requires_attribute(&self) -> bool {
        matches!(self, Self::YesNo | Self::NumericEntry { .. })
    }

    /// Kinds answered by selecting option indices.
    #[must_use]
    pub const fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::SingleChoice | Self::MultiChoice | Self::AttributeToggle
        )
    }

    /// Short name used in mismatch errors and prompts.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SingleChoice => "single_choice",
            Self::MultiChoice => "multi_choice",
            Self::AttributeToggle => "attribute_toggle",
            Self::YesNo => "yes_no",
            Self::NumericEntry { .. } => "numeric_entry",
        }
    }
}

/// One or many implied values; scalars in configuration read as a singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueList {
    /// Several values unioned in together.
    Many(Vec<AttrValue>),
    /// A single value.
    One(AttrValue),
}

impl ValueList {
    /// Iterates the contained values.
    pub fn iter(&self) -> impl Iterator<Item = &AttrValue> {
        match self {
            Self::Many(values) => values.iter(),
            Self::One(value) => std::slice::from_ref(value).iter(),
        }
    }

    /// Folds range tokens in the contained values; applied once at load.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Many(values) => {
                Self::Many(values.into_iter().map(AttrValue::normalized).collect())
            }
            Self::One(value) => Self::One(value.normalized()),
        }
    }
}

/// A selectable answer option.
///
/// The primary value is what lands on the question's own attribute (or, for
/// attribute-toggle questions, the attribute name being switched on). The
/// `implies` sub-mapping is union-merged into the store when the option is
/// chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Primary value of the option.
    pub value: AttrValue,
    /// Additional attribute/value pairs set when this option is chosen.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub implies: BTreeMap<String, ValueList>,
}

impl AnswerOption {
    /// Creates an option with no implied attributes.
    #[must_use]
    pub fn new(value: impl Into<AttrValue>) -> Self {
        Self {
            value: value.into(),
            implies: BTreeMap::new(),
        }
    }

    /// Adds an implied attribute/value pair, appending when the attribute
    /// already carries implied values.
    #[must_use]
    pub fn with_implied(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Self {
        let attribute = attribute.into();
        let value = value.into();
        let merged = match self.implies.remove(&attribute) {
            None => ValueList::One(value),
            Some(ValueList::One(existing)) => ValueList::Many(vec![existing, value]),
            Some(ValueList::Many(mut values)) => {
                values.push(value);
                ValueList::Many(values)
            }
        };
        self.implies.insert(attribute, merged);
        self
    }
}

/// A configured question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt shown to the user.
    pub prompt: String,
    /// Question kind.
    pub kind: QuestionKind,
    /// Attribute the answer is recorded under (where the kind needs one).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Legacy key folded into `attribute` during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Ordered answer options for selection kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AnswerOption>,
    /// Explicit next-question override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<QuestionId>,
}

impl Question {
    /// Creates a question with no attribute, options, or next override.
    #[must_use]
    pub fn new(prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            attribute: None,
            parameter: None,
            options: Vec::new(),
            next: None,
        }
    }

    /// Sets the attribute binding.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the answer options.
    #[must_use]
    pub fn with_options(mut self, options: Vec<AnswerOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets the explicit next-question override.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<QuestionId>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Folds the legacy `parameter` key and any range tokens in option
    /// sub-mappings. Applied once before the first question is asked.
    pub fn normalize(&mut self) {
        if let Some(parameter) = self.parameter.take() {
            self.attribute = Some(parameter);
        }
        for option in &mut self.options {
            let implies = std::mem::take(&mut option.implies);
            option.implies = implies
                .into_iter()
                .map(|(attribute, values)| (attribute, values.normalized()))
                .collect();
        }
    }
}

/// A validated answer delivered by the I/O collaborator.
///
/// The collaborator guarantees the shape is well-typed; the engine still
/// checks business validity (option range, single-choice arity) before any
/// state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Selected option indices (zero-based).
    Selection(Vec<usize>),
    /// Yes (`true`) or no (`false`).
    YesNo(bool),
    /// Numeric entry; exactly zero means "skip".
    Number(f64),
}

impl Answer {
    /// Short name used in mismatch errors.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Selection(_) => "selection",
            Self::YesNo(_) => "yes_no",
            Self::Number(_) => "number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_attribute_requirements() {
        assert!(QuestionKind::YesNo.requires_attribute());
        assert!(QuestionKind::NumericEntry { maximum: true }.requires_attribute());
        assert!(!QuestionKind::SingleChoice.requires_attribute());
        assert!(!QuestionKind::AttributeToggle.requires_attribute());
    }

    #[test]
    fn test_normalize_folds_legacy_parameter_key() {
        let mut question = Question::new("Budget?", QuestionKind::NumericEntry { maximum: true });
        question.parameter = Some("price".to_string());
        question.normalize();
        assert_eq!(question.attribute.as_deref(), Some("price"));
        assert!(question.parameter.is_none());
    }

    #[test]
    fn test_normalize_folds_option_range_tokens() {
        let mut option = AnswerOption::new("gaming");
        option.implies.insert(
            "device_count".to_string(),
            ValueList::One(AttrValue::Text("1+".to_string())),
        );
        let mut question =
            Question::new("Purpose?", QuestionKind::SingleChoice).with_options(vec![option]);
        question.normalize();

        let implied = &question.options[0].implies["device_count"];
        let values: Vec<&AttrValue> = implied.iter().collect();
        assert_eq!(values, vec![&AttrValue::at_least(1.0)]);
    }

    #[test]
    fn test_question_kind_json_tags() {
        let kind: QuestionKind = serde_json::from_str(r#"{"type": "yes_no"}"#).unwrap();
        assert_eq!(kind, QuestionKind::YesNo);

        let kind: QuestionKind =
            serde_json::from_str(r#"{"type": "numeric_entry", "maximum": true}"#).unwrap();
        assert_eq!(kind, QuestionKind::NumericEntry { maximum: true });

        let kind: QuestionKind = serde_json::from_str(r#"{"type": "numeric_entry"}"#).unwrap();
        assert_eq!(kind, QuestionKind::NumericEntry { maximum: false });
    }

    #[test]
    fn test_value_list_scalar_and_list_forms() {
        let one: ValueList = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(one.iter().count(), 1);

        let many: ValueList = serde_json::from_str("[\"compact\", true]").unwrap();
        assert_eq!(many.iter().count(), 2);
    }

    #[test]
    fn test_answer_kind_names() {
        assert_eq!(Answer::Selection(vec![0]).kind_name(), "selection");
        assert_eq!(Answer::YesNo(true).kind_name(), "yes_no");
        assert_eq!(Answer::Number(2.0).kind_name(), "number");
    }
}

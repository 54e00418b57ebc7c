//! The loaded knowledge base: questions, objects, and both rule classes.
//!
//! The four tables arrive from the configuration source already parsed;
//! this module normalizes legacy key names and range tokens once, validates
//! cross-references, and offers JSON loading helpers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::object::CatalogObject;
use crate::production::ProductionRule;
use crate::question::{Question, QuestionId, QuestionKind};
use crate::rule::{Rule, RuleId};

/// Immutable configuration for one or more sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Questions by id.
    #[serde(default)]
    pub questions: BTreeMap<QuestionId, Question>,
    /// Catalog objects in declaration order.
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
    /// Static question-flow rules by id.
    #[serde(default)]
    pub rules: BTreeMap<RuleId, Rule>,
    /// Production rules in firing order.
    #[serde(default)]
    pub production_rules: Vec<ProductionRule>,
}

impl KnowledgeBase {
    /// Assembles a knowledge base from the four tables.
    #[must_use]
    pub fn new(
        questions: BTreeMap<QuestionId, Question>,
        objects: Vec<CatalogObject>,
        rules: BTreeMap<RuleId, Rule>,
        production_rules: Vec<ProductionRule>,
    ) -> Self {
        Self {
            questions,
            objects,
            rules,
            production_rules,
        }
    }

    /// Loads and validates a knowledge base from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut kb: Self = serde_json::from_str(json)?;
        kb.normalize();
        kb.validate()?;
        Ok(kb)
    }

    /// Loads and validates a knowledge base from a reader.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Self::from_json_str(&json)
    }

    /// Loads and validates a knowledge base from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Folds legacy key names and range tokens across all tables.
    ///
    /// Runs once, before any question is asked; re-running is a no-op.
    pub fn normalize(&mut self) {
        for question in self.questions.values_mut() {
            question.normalize();
        }
        for rule in self.rules.values_mut() {
            rule.normalize();
        }
        for rule in &mut self.production_rules {
            rule.normalize();
        }
    }

    /// Checks every cross-reference and per-question requirement.
    ///
    /// A failure here is an authoring defect and aborts the run before the
    /// session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.questions.contains_key(&QuestionId::ENTRY) {
            return Err(ConfigError::UnknownQuestion {
                id: QuestionId::ENTRY,
                referenced_by: "session entry point".to_string(),
            });
        }

        for (id, question) in &self.questions {
            if question.kind.requires_attribute() && question.attribute.is_none() {
                return Err(ConfigError::MissingAttribute {
                    question: *id,
                    kind: question.kind.name(),
                });
            }
            if question.kind.is_selection() && question.options.is_empty() {
                return Err(ConfigError::NoOptions {
                    question: *id,
                    kind: question.kind.name(),
                });
            }
            if question.kind == QuestionKind::AttributeToggle {
                for (index, option) in question.options.iter().enumerate() {
                    if option.value.as_text().is_none() {
                        return Err(ConfigError::OptionNotAttribute {
                            question: *id,
                            index,
                        });
                    }
                }
            }
            if let Some(next) = question.next {
                if !self.questions.contains_key(&next) {
                    return Err(ConfigError::UnknownQuestion {
                        id: next,
                        referenced_by: format!("question {id} next override"),
                    });
                }
            }
        }

        for (rule_id, rule) in &self.rules {
            for question_id in rule.include.iter().chain(rule.skip.iter()) {
                if !self.questions.contains_key(question_id) {
                    return Err(ConfigError::UnknownQuestion {
                        id: *question_id,
                        referenced_by: format!("rule {rule_id}"),
                    });
                }
            }
        }

        let mut names = BTreeSet::new();
        for object in &self.objects {
            if !names.insert(object.name.as_str()) {
                return Err(ConfigError::DuplicateObject {
                    name: object.name.clone(),
                });
            }
        }

        let mut ids = BTreeSet::new();
        for rule in &self.production_rules {
            if !ids.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateProductionRule {
                    id: rule.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::AnswerOption;
    use crate::value::AttrValue;

    fn entry_question() -> Question {
        Question::new("Purpose?", QuestionKind::SingleChoice)
            .with_attribute("purpose")
            .with_options(vec![AnswerOption::new("office"), AnswerOption::new("gaming")])
    }

    fn base_with(questions: Vec<(u32, Question)>) -> KnowledgeBase {
        let questions = questions
            .into_iter()
            .map(|(id, q)| (QuestionId(id), q))
            .collect();
        KnowledgeBase::new(questions, Vec::new(), BTreeMap::new(), Vec::new())
    }

    #[test]
    fn test_missing_entry_question_is_fatal() {
        let kb = base_with(vec![(2, entry_question())]);
        let err = kb.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownQuestion {
                id: QuestionId::ENTRY,
                ..
            }
        ));
    }

    #[test]
    fn test_yes_no_requires_attribute() {
        let kb = base_with(vec![(1, Question::new("Wireless?", QuestionKind::YesNo))]);
        let err = kb.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingAttribute { .. }));
    }

    #[test]
    fn test_choice_requires_options() {
        let kb = base_with(vec![(
            1,
            Question::new("Pick one", QuestionKind::SingleChoice),
        )]);
        let err = kb.validate().unwrap_err();
        assert!(matches!(err, ConfigError::NoOptions { .. }));
    }

    #[test]
    fn test_toggle_options_must_name_attributes() {
        let toggle = Question::new("Extras?", QuestionKind::AttributeToggle)
            .with_options(vec![AnswerOption::new(AttrValue::Number(4.0))]);
        let kb = base_with(vec![(1, toggle)]);
        let err = kb.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OptionNotAttribute { index: 0, .. }
        ));
    }

    #[test]
    fn test_dangling_next_override_is_fatal() {
        let kb = base_with(vec![(1, entry_question().with_next(9u32))]);
        let err = kb.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownQuestion {
                id: QuestionId(9),
                ..
            }
        ));
    }

    #[test]
    fn test_dangling_rule_target_is_fatal() {
        let mut kb = base_with(vec![(1, entry_question())]);
        kb.rules.insert(RuleId(1), Rule::new().includes([5]));
        let err = kb.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownQuestion {
                id: QuestionId(5),
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_object_names_are_fatal() {
        let mut kb = base_with(vec![(1, entry_question())]);
        kb.objects.push(CatalogObject::new("kb-1"));
        kb.objects.push(CatalogObject::new("kb-1"));
        let err = kb.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateObject { .. }));
    }

    #[test]
    fn test_from_json_str_normalizes_before_validation() {
        let json = r#"{
            "questions": {
                "1": {
                    "prompt": "Budget?",
                    "kind": {"type": "numeric_entry", "maximum": true},
                    "parameter": "price"
                }
            }
        }"#;
        let kb = KnowledgeBase::from_json_str(json).unwrap();
        let question = &kb.questions[&QuestionId::ENTRY];
        // Legacy key folded before the attribute requirement is checked.
        assert_eq!(question.attribute.as_deref(), Some("price"));
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        let err = KnowledgeBase::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut rule = Rule::new();
        rule.parameters = Some(BTreeMap::from([(
            "price".to_string(),
            crate::condition::Condition::Is(AttrValue::Text("cond 100-".to_string())),
        )]));
        let mut kb = base_with(vec![(1, entry_question())]);
        kb.rules.insert(RuleId(1), rule);

        kb.normalize();
        let once = kb.clone();
        kb.normalize();
        assert_eq!(kb, once);
    }
}

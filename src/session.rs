//! One elicitation session: the question-flow state machine.
//!
//! A session owns the attribute store and the remaining/excluded question
//! sets. Answers are recorded per question kind, the static-rule pass runs
//! after every answer, and `finish` runs the production pass and the catalog
//! filter to produce the recommendation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ConfigError, ElicitResult, InputError, SessionError};
use crate::knowledge::KnowledgeBase;
use crate::object::filter_catalog;
use crate::production::run_production_pass;
use crate::question::{Answer, Question, QuestionId, QuestionKind};
use crate::rule::RuleId;
use crate::store::AttributeStore;
use crate::value::AttrValue;

/// Unique identifier for a session, used to correlate log lines of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supplies one validated answer per asked question.
///
/// Implementations own the user-facing boundary: prompting, parsing raw
/// text, and bounding retries on malformed input. The engine only ever
/// receives well-typed answers and is never re-entered mid-question.
pub trait AnswerSource {
    /// Produces an answer for the question being asked.
    fn answer(&mut self, id: QuestionId, question: &Question) -> ElicitResult<Answer>;
}

/// Final report of one session.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Which session produced this report.
    pub session: SessionId,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session finished.
    pub finished_at: DateTime<Utc>,
    /// Names of catalog objects matching the accumulated constraints,
    /// in catalog order.
    pub matched: Vec<String>,
    /// The final attribute store, production-rule derivations included.
    pub attributes: AttributeStore,
}

/// One interactive elicitation run over a knowledge base.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    knowledge: KnowledgeBase,
    store: AttributeStore,
    remaining: BTreeSet<QuestionId>,
    excluded: BTreeSet<QuestionId>,
    current: Option<QuestionId>,
}

impl Session {
    /// Builds a session over the given knowledge base.
    ///
    /// Normalizes legacy keys and range tokens, then validates every
    /// cross-reference; a defective configuration never starts a session.
    /// The flow begins at question 1.
    pub fn new(mut knowledge: KnowledgeBase) -> Result<Self, ConfigError> {
        knowledge.normalize();
        knowledge.validate()?;
        Ok(Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            knowledge,
            store: AttributeStore::new(),
            remaining: BTreeSet::from([QuestionId::ENTRY]),
            excluded: BTreeSet::new(),
            current: Some(QuestionId::ENTRY),
        })
    }

    /// This session's identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The accumulated attribute store.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeStore {
        &self.store
    }

    /// The knowledge base this session runs over.
    #[must_use]
    pub const fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Question ids still eligible to be asked.
    #[must_use]
    pub const fn remaining(&self) -> &BTreeSet<QuestionId> {
        &self.remaining
    }

    /// Question ids already asked or skipped.
    #[must_use]
    pub const fn excluded(&self) -> &BTreeSet<QuestionId> {
        &self.excluded
    }

    /// The question currently being asked, if the flow has not terminated.
    #[must_use]
    pub fn current_question(&self) -> Option<(QuestionId, &Question)> {
        let id = self.current?;
        self.knowledge.questions.get(&id).map(|q| (id, q))
    }

    /// Returns true once no question remains to ask.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// Redirects the flow to a specific question.
    ///
    /// Answered or skipped questions are never re-askable.
    pub fn set_current(&mut self, id: QuestionId) -> ElicitResult<()> {
        if !self.knowledge.questions.contains_key(&id) {
            return Err(SessionError::UnknownQuestion { id }.into());
        }
        if self.excluded.contains(&id) {
            return Err(SessionError::AlreadyAnswered { id }.into());
        }
        self.current = Some(id);
        Ok(())
    }

    /// Answers the current question and advances the flow.
    ///
    /// Business validation (option range, single-choice arity) happens
    /// before any state change, so a rejected answer leaves the session
    /// untouched and the boundary can re-prompt safely. On success the
    /// answered question is permanently excluded, the static-rule pass
    /// runs, and the next question id (if any) is returned.
    pub fn submit(&mut self, answer: &Answer) -> ElicitResult<Option<QuestionId>> {
        let Some(id) = self.current else {
            return Err(SessionError::Finished.into());
        };
        let question = self
            .knowledge
            .questions
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownQuestion { id })?;

        validate_answer(&question, answer)?;

        self.excluded.insert(id);
        self.record_answer(&question, answer);
        self.apply_rules();

        let next = question
            .next
            .filter(|target| !self.excluded.contains(target))
            .or_else(|| self.remaining.iter().next().copied());
        debug!(session = %self.id, question = %id, next = ?next, "question answered");
        self.current = next;
        Ok(next)
    }

    /// Evaluates one static rule and applies its effects on match.
    ///
    /// Does not reconcile the remaining/excluded sets; the full pass does.
    pub fn apply_rule(&mut self, id: RuleId) -> ElicitResult<bool> {
        let rule = self
            .knowledge
            .rules
            .get(&id)
            .cloned()
            .ok_or(SessionError::UnknownRule { id })?;
        let matched = rule.matches(&self.store);
        if matched {
            self.remaining.extend(rule.include.iter().copied());
            self.excluded.extend(rule.skip.iter().copied());
        }
        Ok(matched)
    }

    /// Evaluates every static rule against the store and reconciles the
    /// remaining set against the excluded set.
    ///
    /// Runs after every answer; with no new attributes the pass is
    /// idempotent.
    pub fn apply_rules(&mut self) {
        for (rule_id, rule) in &self.knowledge.rules {
            if rule.matches(&self.store) {
                debug!(session = %self.id, rule = %rule_id, "static rule matched");
                self.remaining.extend(rule.include.iter().copied());
                self.excluded.extend(rule.skip.iter().copied());
            }
        }
        let excluded = &self.excluded;
        self.remaining.retain(|id| !excluded.contains(id));
    }

    /// Checks a single catalog object against the current constraints.
    pub fn object_matches(&self, name: &str) -> ElicitResult<bool> {
        let object = self
            .knowledge
            .objects
            .iter()
            .find(|object| object.name == name)
            .ok_or_else(|| SessionError::UnknownObject {
                name: name.to_string(),
            })?;
        Ok(object.matches(&self.store))
    }

    /// Ends the session: runs the production pass once, filters the
    /// catalog, and reports the matches.
    ///
    /// Consumes the session, so the production pass cannot run twice.
    #[must_use]
    pub fn finish(mut self) -> Recommendation {
        let fired = run_production_pass(&self.knowledge.production_rules, &mut self.store);
        let matched = filter_catalog(&self.knowledge.objects, &self.store)
            .into_iter()
            .map(|object| object.name.clone())
            .collect::<Vec<_>>();
        debug!(
            session = %self.id,
            rules_fired = fired,
            matches = matched.len(),
            "session finished"
        );
        Recommendation {
            session: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            matched,
            attributes: self.store,
        }
    }

    /// Drives the whole flow against an answer source, then finishes.
    ///
    /// Recoverable validation failures re-ask the same question; errors
    /// from the source itself (including an exhausted retry budget)
    /// propagate.
    pub fn run(mut self, source: &mut dyn AnswerSource) -> ElicitResult<Recommendation> {
        while let Some(id) = self.current {
            let question = self
                .knowledge
                .questions
                .get(&id)
                .cloned()
                .ok_or(SessionError::UnknownQuestion { id })?;
            let answer = source.answer(id, &question)?;
            match self.submit(&answer) {
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    debug!(session = %self.id, question = %id, error = %e, "answer rejected, re-asking");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.finish())
    }

    fn record_answer(&mut self, question: &Question, answer: &Answer) {
        match (&question.kind, answer) {
            (
                QuestionKind::SingleChoice | QuestionKind::MultiChoice,
                Answer::Selection(indices),
            ) => {
                for &index in indices {
                    let option = &question.options[index];
                    if let Some(attribute) = &question.attribute {
                        self.store.add(attribute.clone(), option.value.clone());
                    }
                    for (attribute, values) in &option.implies {
                        for value in values.iter() {
                            self.store.add(attribute.clone(), value.clone());
                        }
                    }
                }
            }
            (QuestionKind::AttributeToggle, Answer::Selection(indices)) => {
                for &index in indices {
                    if let Some(attribute) = question.options[index].value.as_text() {
                        self.store.set(attribute.to_string(), AttrValue::Bool(true));
                    }
                }
            }
            (QuestionKind::YesNo, Answer::YesNo(choice)) => {
                if let Some(attribute) = &question.attribute {
                    self.store.set(attribute.clone(), AttrValue::Bool(*choice));
                }
            }
            (QuestionKind::NumericEntry { maximum }, Answer::Number(value)) => {
                // Exactly zero means "skip": nothing is recorded.
                if *value != 0.0 {
                    if let Some(attribute) = &question.attribute {
                        let marker = if *maximum {
                            AttrValue::at_most(*value)
                        } else {
                            AttrValue::at_least(*value)
                        };
                        self.store.add(attribute.clone(), marker);
                    }
                }
            }
            // Shape mismatches are rejected by validate_answer.
            _ => {}
        }
    }
}

/// Business validation of an answer against the question being asked.
///
/// Must not mutate anything: rejection leaves the session untouched so
/// retries cannot double-record.
fn validate_answer(question: &Question, answer: &Answer) -> ElicitResult<()> {
    let check_indices = |indices: &[usize]| -> ElicitResult<()> {
        for &index in indices {
            if index >= question.options.len() {
                return Err(InputError::OptionOutOfRange {
                    index,
                    available: question.options.len(),
                }
                .into());
            }
        }
        Ok(())
    };

    match (question.kind, answer) {
        (QuestionKind::SingleChoice, Answer::Selection(indices)) => {
            if indices.len() != 1 {
                return Err(InputError::SelectionArity {
                    expected: 1,
                    got: indices.len(),
                }
                .into());
            }
            check_indices(indices)
        }
        (
            QuestionKind::MultiChoice | QuestionKind::AttributeToggle,
            Answer::Selection(indices),
        ) => check_indices(indices),
        (QuestionKind::YesNo, Answer::YesNo(_))
        | (QuestionKind::NumericEntry { .. }, Answer::Number(_)) => Ok(()),
        (kind, answer) => Err(SessionError::AnswerMismatch {
            expected: kind.name(),
            got: answer.kind_name(),
        }
        .into()),
    }
}

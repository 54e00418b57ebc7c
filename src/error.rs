//! Error types for the elicitation engine.
//!
//! All errors are strongly typed using thiserror. Configuration defects are
//! fatal; input errors are recoverable and only ever trigger a re-prompt at
//! the I/O boundary.

use thiserror::Error;

use crate::question::QuestionId;
use crate::rule::RuleId;

/// Fatal configuration defects, detected before the first question.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Question {id} referenced by {referenced_by} does not exist")]
    UnknownQuestion {
        id: QuestionId,
        referenced_by: String,
    },

    #[error("Question {question} of kind '{kind}' requires an attribute binding")]
    MissingAttribute {
        question: QuestionId,
        kind: &'static str,
    },

    #[error("Question {question} option {index} must name an attribute")]
    OptionNotAttribute {
        question: QuestionId,
        index: usize,
    },

    #[error("Question {question} of kind '{kind}' has no answer options")]
    NoOptions {
        question: QuestionId,
        kind: &'static str,
    },

    #[error("Catalog object '{name}' is declared more than once")]
    DuplicateObject {
        name: String,
    },

    #[error("Production rule '{id}' is declared more than once")]
    DuplicateProductionRule {
        id: String,
    },

    #[error("Failed to read knowledge base: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Malformed knowledge base: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },
}

/// Engine misuse during a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is finished; no question is active")]
    Finished,

    #[error("Question {id} does not exist in this session")]
    UnknownQuestion {
        id: QuestionId,
    },

    #[error("Question {id} was already asked or excluded")]
    AlreadyAnswered {
        id: QuestionId,
    },

    #[error("Rule {id} does not exist in this session")]
    UnknownRule {
        id: RuleId,
    },

    #[error("Object '{name}' does not exist in this catalog")]
    UnknownObject {
        name: String,
    },

    #[error("Question expects a '{expected}' answer, got '{got}'")]
    AnswerMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

/// Recoverable answer-validation failures; the boundary re-prompts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Option {index} is out of range (question has {available} options)")]
    OptionOutOfRange {
        index: usize,
        available: usize,
    },

    #[error("Expected {expected} selection(s), got {got}")]
    SelectionArity {
        expected: usize,
        got: usize,
    },

    #[error("Gave up after {attempts} malformed answers")]
    RetriesExhausted {
        attempts: u32,
    },
}

/// Top-level error type for the elicitation engine.
#[derive(Debug, Error)]
pub enum ElicitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

impl ElicitError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a session error.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns true if this is an input error.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Returns true if the caller should re-prompt rather than abort.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            // Configuration and session errors will not change on retry.
            Self::Config(_) | Self::Session(_) => false,
            Self::Input(e) => !matches!(e, InputError::RetriesExhausted { .. }),
        }
    }
}

/// Result type alias for elicitation operations.
pub type ElicitResult<T> = Result<T, ElicitError>;

//! Error types for answer-key validation, scoring, and legacy upgrades.
//!
//! Learner-input problems are never represented here: a malformed answer
//! scores zero. These errors describe broken question data, which callers
//! surface as authoring problems.

use thiserror::Error;

use crate::model::QuestionKind;

/// A question whose answer key does not fit its kind or its item lists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The answer-key variant does not match the declared kind.
    #[error("answer key is {found} but question kind is {expected}")]
    KindMismatch {
        expected: QuestionKind,
        found: QuestionKind,
    },

    /// Weight must be a positive, finite number.
    #[error("weight must be positive, got {0}")]
    InvalidWeight(f64),

    /// A choice index points past the end of `options`.
    #[error("option index {index} out of range (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    /// A multi-choice key with no correct options.
    #[error("multiple-choice answer key has no correct options")]
    EmptyChoiceSet,

    /// A matching left id outside `1..=options.len()`.
    #[error("matching left item {id} does not exist (question has {len} left items)")]
    LeftItemOutOfRange { id: u32, len: usize },

    /// A matching right id outside `1..=matching_right_options.len()`.
    #[error("matching right item {id} does not exist (question has {len} right items)")]
    RightItemOutOfRange { id: u32, len: usize },

    /// A true/false entry for a statement that does not exist.
    #[error("statement {index} out of range (question has {len} statements)")]
    StatementOutOfRange { index: usize, len: usize },

    /// A statement the true/false key does not cover.
    #[error("statement {0} has no true/false answer")]
    MissingStatement(usize),

    /// Option lists present on a kind that does not use them.
    #[error("{kind} questions must not carry {field}")]
    UnexpectedItems {
        kind: QuestionKind,
        field: &'static str,
    },
}

/// Scoring could not run because a question is misconfigured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("question '{question_id}' has an invalid answer key: {source}")]
    InvalidQuestion {
        question_id: String,
        #[source]
        source: ValidationError,
    },

    #[error("question id '{0}' is used more than once")]
    DuplicateQuestionId(String),
}

impl ScoringError {
    /// The id of the offending question.
    pub fn question_id(&self) -> &str {
        match self {
            ScoringError::InvalidQuestion { question_id, .. } => question_id,
            ScoringError::DuplicateQuestionId(question_id) => question_id,
        }
    }
}

/// A legacy record that could not be upgraded to a canonical question.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LegacyError {
    #[error("legacy record is not a JSON object")]
    NotAnObject,

    #[error("legacy record has no id")]
    MissingId,

    #[error("legacy record '{0}' has no question text")]
    MissingPrompt(String),

    #[error("legacy record '{id}': answer key cannot be read as {kind}")]
    UnreadableAnswerKey { id: String, kind: QuestionKind },

    #[error("legacy record '{id}': {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },
}

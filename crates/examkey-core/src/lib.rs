//! examkey-core — answer-key model, scoring, and import normalization.
//!
//! This crate defines the canonical question representation for the five
//! question kinds, the deterministic scoring engine, the import normalizers
//! that convert spreadsheet rows and text documents into questions, and the
//! classifier used to migrate legacy records. Everything here is a pure
//! function of its inputs.

pub mod classify;
pub mod error;
pub mod ingest;
pub mod legacy;
pub mod model;
pub mod scoring;

pub use classify::classify_legacy_question;
pub use error::{LegacyError, ScoringError, ValidationError};
pub use ingest::{
    parse_spreadsheet_rows, parse_text_blocks, parse_word_blocks, IngestOptions, IngestOutcome,
    RowError, RowErrorKind, SpreadsheetRow,
};
pub use legacy::upgrade_legacy_question;
pub use model::{
    validate_question, Answer, AnswerKey, AnswerValue, Question, QuestionDraft, QuestionKind,
    ScoreResult,
};
pub use scoring::{question_points, score, score_submission, score_validated, validate_questions};

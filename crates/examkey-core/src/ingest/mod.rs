//! Import normalizers.
//!
//! Spreadsheet rows, plain-text blocks, and word-processor blocks are each
//! read into a [`RawRecord`] of loose string fields, then converted into a
//! canonical [`QuestionDraft`] by [`build_draft`]. A record that fails
//! produces a [`RowError`] and is left out of the drafts; the rest of the
//! batch is still processed.

use std::fmt;

use thiserror::Error;

use crate::error::ValidationError;
use crate::model::{QuestionDraft, QuestionKind};

pub mod grammar;
mod lines;
pub mod spreadsheet;
pub mod text;
pub mod word;

pub use spreadsheet::{parse_spreadsheet_rows, parse_spreadsheet_rows_with, SpreadsheetRow};
pub use text::{parse_text_blocks, parse_text_blocks_with};
pub use word::{parse_word_blocks, parse_word_blocks_with};

use grammar::{parse_answer_key, parse_weight, KeyBounds};

/// Tunables shared by every import format.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Cell values treated as "no option" (compared case-insensitively).
    pub placeholders: Vec<String>,
    /// How many lettered options (`A`, `B`, ...) and numbered items a record
    /// may carry.
    pub max_options: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            placeholders: vec!["-".to_string()],
            max_options: 5,
        }
    }
}

impl IngestOptions {
    pub(crate) fn option_limit(&self) -> usize {
        self.max_options.clamp(1, 26)
    }

    fn is_placeholder(&self, value: &str) -> bool {
        value.is_empty()
            || self
                .placeholders
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(value))
    }

    /// Drop blank and placeholder entries, keeping order.
    fn clean(&self, items: &[String]) -> Vec<String> {
        items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !self.is_placeholder(s))
            .map(str::to_string)
            .collect()
    }
}

/// Where a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    SpreadsheetRow,
    TextBlock,
    WordBlock,
}

impl fmt::Display for RowOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOrigin::SpreadsheetRow => write!(f, "row"),
            RowOrigin::TextBlock | RowOrigin::WordBlock => write!(f, "block"),
        }
    }
}

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowErrorKind {
    #[error("question type is missing")]
    MissingType,

    #[error("unknown question type '{0}'")]
    UnknownType(String),

    #[error("question text is empty")]
    EmptyPrompt,

    #[error("{kind} question needs at least {required} {items}, found {found}")]
    TooFewOptions {
        kind: QuestionKind,
        items: &'static str,
        required: usize,
        found: usize,
    },

    #[error("answer key is empty")]
    EmptyAnswerKey,

    #[error("answer key '{0}' does not reference any existing option")]
    AnswerOutOfRange(String),

    #[error("invalid weight '{0}'")]
    InvalidWeight(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A rejected record. `position` is 1-based within the import.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{origin} {position}: {kind}")]
pub struct RowError {
    pub origin: RowOrigin,
    pub position: usize,
    pub kind: RowErrorKind,
}

/// Drafts that normalized cleanly plus diagnostics for the records that did
/// not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub drafts: Vec<QuestionDraft>,
    pub errors: Vec<RowError>,
}

impl IngestOutcome {
    pub fn into_parts(self) -> (Vec<QuestionDraft>, Vec<RowError>) {
        (self.drafts, self.errors)
    }

    fn push(&mut self, origin: RowOrigin, position: usize, result: Result<QuestionDraft, RowErrorKind>) {
        match result {
            Ok(draft) => self.drafts.push(draft),
            Err(kind) => {
                tracing::debug!(%origin, position, error = %kind, "rejecting import record");
                self.errors.push(RowError {
                    origin,
                    position,
                    kind,
                });
            }
        }
    }
}

/// Loose string fields of one import record, before normalization.
///
/// `options` is indexed by letter (`A` = 0) and `items` by ordinal
/// (`1` = 0); gaps hold empty strings and are dropped as blanks.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawRecord {
    pub type_token: Option<String>,
    pub prompt: String,
    pub options: Vec<String>,
    pub items: Vec<String>,
    pub answer: Option<String>,
    pub weight: Option<String>,
}

impl RawRecord {
    pub fn set_option(&mut self, index: usize, text: &str) {
        set_slot(&mut self.options, index, text);
    }

    pub fn set_item(&mut self, index: usize, text: &str) {
        set_slot(&mut self.items, index, text);
    }

    pub fn push_prompt_line(&mut self, line: &str) {
        if !self.prompt.is_empty() {
            self.prompt.push('\n');
        }
        self.prompt.push_str(line);
    }
}

fn set_slot(slots: &mut Vec<String>, index: usize, text: &str) {
    if slots.len() <= index {
        slots.resize(index + 1, String::new());
    }
    slots[index] = text.to_string();
}

/// Normalize one record into a validated draft.
pub(crate) fn build_draft(
    record: RawRecord,
    opts: &IngestOptions,
) -> Result<QuestionDraft, RowErrorKind> {
    let token = record
        .type_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RowErrorKind::MissingType)?;
    let kind =
        QuestionKind::from_token(token).ok_or_else(|| RowErrorKind::UnknownType(token.to_string()))?;

    let prompt = record.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(RowErrorKind::EmptyPrompt);
    }
    let weight = parse_weight(record.weight.as_deref())?;

    let lettered = opts.clean(&record.options);
    let numbered = opts.clean(&record.items);
    let (options, right_options) = match kind {
        QuestionKind::SingleChoice | QuestionKind::MultiChoice => {
            require(kind, "options", 2, lettered.len())?;
            (lettered, Vec::new())
        }
        QuestionKind::Matching => {
            require(kind, "left items", 1, numbered.len())?;
            require(kind, "right items", 2, lettered.len())?;
            (numbered, lettered)
        }
        QuestionKind::TrueFalseSet => {
            let statements = if lettered.is_empty() { numbered } else { lettered };
            require(kind, "statements", 1, statements.len())?;
            (statements, Vec::new())
        }
        QuestionKind::Essay => (Vec::new(), Vec::new()),
    };

    let bounds = KeyBounds {
        items: options.len(),
        right_items: right_options.len(),
    };
    let answer_key = parse_answer_key(kind, record.answer.as_deref().unwrap_or(""), bounds)?;

    let draft = QuestionDraft {
        kind,
        prompt,
        weight,
        options,
        matching_right_options: right_options,
        answer_key,
    };
    draft.validate()?;
    Ok(draft)
}

fn require(
    kind: QuestionKind,
    items: &'static str,
    required: usize,
    found: usize,
) -> Result<(), RowErrorKind> {
    if found < required {
        return Err(RowErrorKind::TooFewOptions {
            kind,
            items,
            required,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKey;

    fn record(token: &str, options: &[&str], answer: &str) -> RawRecord {
        RawRecord {
            type_token: Some(token.into()),
            prompt: "  Pertanyaan?  ".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            items: vec![],
            answer: Some(answer.into()),
            weight: None,
        }
    }

    #[test]
    fn placeholders_are_dropped() {
        let opts = IngestOptions::default();
        let draft = build_draft(record("SINGLE", &["x", " ", "y", "-", "z"], "C"), &opts).unwrap();
        assert_eq!(draft.options, vec!["x", "y", "z"]);
        assert_eq!(draft.answer_key, AnswerKey::SingleChoice { index: 2 });
        assert_eq!(draft.prompt, "Pertanyaan?");
        assert_eq!(draft.weight, 1.0);
    }

    #[test]
    fn custom_placeholders() {
        let opts = IngestOptions {
            placeholders: vec!["-".into(), "n/a".into()],
            max_options: 5,
        };
        let err = build_draft(record("MULTIPLE", &["x", "N/A"], "A"), &opts).unwrap_err();
        assert_eq!(
            err,
            RowErrorKind::TooFewOptions {
                kind: QuestionKind::MultiChoice,
                items: "options",
                required: 2,
                found: 1
            }
        );
    }

    #[test]
    fn type_token_problems() {
        let opts = IngestOptions::default();
        let mut r = record("", &["a", "b"], "A");
        assert_eq!(build_draft(r.clone(), &opts), Err(RowErrorKind::MissingType));
        r.type_token = Some("RANKING".into());
        assert_eq!(
            build_draft(r, &opts),
            Err(RowErrorKind::UnknownType("RANKING".into()))
        );
    }

    #[test]
    fn empty_prompt_rejected() {
        let mut r = record("SINGLE", &["a", "b"], "A");
        r.prompt = " \n ".into();
        assert_eq!(
            build_draft(r, &IngestOptions::default()),
            Err(RowErrorKind::EmptyPrompt)
        );
    }

    #[test]
    fn true_false_must_cover_every_statement() {
        let err = build_draft(
            record("TRUE_FALSE", &["s1", "s2", "s3"], "1-B;2-S"),
            &IngestOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RowErrorKind::Invalid(ValidationError::MissingStatement(2))
        );
    }

    #[test]
    fn essay_may_be_ungraded() {
        let draft = build_draft(record("ESSAY", &["ignored"], ""), &IngestOptions::default()).unwrap();
        assert!(draft.options.is_empty());
        assert_eq!(
            draft.answer_key,
            AnswerKey::Essay {
                expected_text: String::new()
            }
        );
    }

    #[test]
    fn row_error_display() {
        let err = RowError {
            origin: RowOrigin::SpreadsheetRow,
            position: 4,
            kind: RowErrorKind::EmptyAnswerKey,
        };
        assert_eq!(err.to_string(), "row 4: answer key is empty");
    }
}

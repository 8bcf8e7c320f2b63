//! Answer-key and field grammar shared by every import format.
//!
//! Letters address options (`A` is index 0). Ordinals are 1-based and address
//! matching left items or true/false statements. Lists are separated by `;`
//! or `,`.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AnswerKey, QuestionKind};

use super::RowErrorKind;

/// Zero-based index of a single option letter (`B` -> 1). Lower case is
/// accepted.
pub fn letter_index(token: &str) -> Option<usize> {
    let mut chars = token.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
        }
        _ => None,
    }
}

/// Split a list field on `;` and `,`, dropping empty entries.
pub fn split_entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([';', ',']).map(str::trim).filter(|t| !t.is_empty())
}

/// Truth value of a true/false token: `B`/`BENAR`/`TRUE` or `S`/`SALAH`/`FALSE`.
pub fn truth_value(token: &str) -> Option<bool> {
    match token.trim().to_uppercase().as_str() {
        "B" | "BENAR" | "TRUE" => Some(true),
        "S" | "SALAH" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Parse an optional weight cell. Blank means the default weight of 1; a
/// comma is accepted as the decimal separator.
pub fn parse_weight(raw: Option<&str>) -> Result<f64, RowErrorKind> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(1.0);
    };
    match raw.replace(',', ".").parse::<f64>() {
        Ok(w) if w.is_finite() && w > 0.0 => Ok(w),
        _ => Err(RowErrorKind::InvalidWeight(raw.to_string())),
    }
}

/// Item counts an answer key may reference.
#[derive(Debug, Clone, Copy)]
pub struct KeyBounds {
    /// Choice options, true/false statements, or matching left items.
    pub items: usize,
    /// Matching right items; unused for other kinds.
    pub right_items: usize,
}

/// Parse the answer-key field of an import record.
///
/// Entries pointing outside `bounds` are dropped; the key fails only when
/// nothing valid remains. Essay keys are taken verbatim.
pub fn parse_answer_key(
    kind: QuestionKind,
    raw: &str,
    bounds: KeyBounds,
) -> Result<AnswerKey, RowErrorKind> {
    let out_of_range = || RowErrorKind::AnswerOutOfRange(raw.trim().to_string());

    match kind {
        QuestionKind::Essay => Ok(AnswerKey::Essay {
            expected_text: raw.to_string(),
        }),
        _ if raw.trim().is_empty() => Err(RowErrorKind::EmptyAnswerKey),
        QuestionKind::SingleChoice => letter_index(raw)
            .filter(|&i| i < bounds.items)
            .map(|index| AnswerKey::SingleChoice { index })
            .ok_or_else(out_of_range),
        QuestionKind::MultiChoice => {
            let indices: BTreeSet<usize> = split_entries(raw)
                .filter_map(|token| {
                    let index = letter_index(token).filter(|&i| i < bounds.items);
                    if index.is_none() {
                        tracing::debug!(token, "dropping option letter outside the option list");
                    }
                    index
                })
                .collect();
            if indices.is_empty() {
                return Err(out_of_range());
            }
            Ok(AnswerKey::MultiChoice { indices })
        }
        QuestionKind::Matching => {
            let mut pairs = BTreeMap::new();
            for token in split_entries(raw) {
                match matching_pair(token, bounds) {
                    Some((left, right)) => {
                        pairs.insert(left, right);
                    }
                    None => tracing::debug!(token, "dropping unresolvable matching pair"),
                }
            }
            if pairs.is_empty() {
                return Err(out_of_range());
            }
            Ok(AnswerKey::Matching { pairs })
        }
        QuestionKind::TrueFalseSet => {
            let mut per_statement = BTreeMap::new();
            for token in split_entries(raw) {
                match statement_entry(token, bounds.items) {
                    Some((index, truth)) => {
                        per_statement.insert(index, truth);
                    }
                    None => tracing::debug!(token, "dropping unresolvable true/false entry"),
                }
            }
            if per_statement.is_empty() {
                return Err(out_of_range());
            }
            Ok(AnswerKey::TrueFalseSet { per_statement })
        }
    }
}

/// `"<leftOrdinal>-<rightLetter>"`, e.g. `"1-C"` -> `(1, 3)`.
fn matching_pair(token: &str, bounds: KeyBounds) -> Option<(u32, u32)> {
    let (left, right) = token.split_once('-')?;
    let left: u32 = left.trim().parse().ok()?;
    let right = letter_index(right)? + 1;
    if left == 0 || left as usize > bounds.items || right > bounds.right_items {
        return None;
    }
    Some((left, u32::try_from(right).ok()?))
}

/// `"<statementOrdinal>-<truth>"`, e.g. `"2-S"` -> `(1, false)`.
fn statement_entry(token: &str, statements: usize) -> Option<(usize, bool)> {
    let (ordinal, truth) = token.split_once('-')?;
    let ordinal: usize = ordinal.trim().parse().ok()?;
    if ordinal == 0 || ordinal > statements {
        return None;
    }
    Some((ordinal - 1, truth_value(truth)?))
}

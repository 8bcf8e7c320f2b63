//! Kind inference for legacy question records that carry no explicit kind.
//!
//! Legacy records stored a loosely shaped answer key. The heuristics below
//! are ordered and the first match wins; they are used once, when such
//! records are migrated, and never during scoring.

use serde_json::Value;

use crate::model::QuestionKind;

/// Infer the kind of a legacy record from the shape of its answer key.
///
/// 1. `answerKey.index` is a number: single choice.
/// 2. `matchingRightOptions` is non-empty or `answerKey.pairs` exists: matching.
/// 3. `answerKey` is an array or has `indices`: multiple choice.
/// 4. `answerKey` is an object with at least one boolean value: true/false set.
/// 5. `answerKey` is a string, or has a string `text`, that is not purely
///    numeric: essay.
/// 6. Anything else: single choice.
pub fn classify_legacy_question(raw: &Value) -> QuestionKind {
    let key = answer_key_of(raw);

    if key.and_then(|k| k.get("index")).is_some_and(Value::is_number) {
        return QuestionKind::SingleChoice;
    }

    let has_right_options = field(raw, &["matchingRightOptions", "matching_right_options"])
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty());
    if has_right_options || key.and_then(|k| k.get("pairs")).is_some() {
        return QuestionKind::Matching;
    }

    if key.is_some_and(|k| k.is_array() || k.get("indices").is_some()) {
        return QuestionKind::MultiChoice;
    }

    if key
        .and_then(Value::as_object)
        .is_some_and(|map| map.values().any(Value::is_boolean))
    {
        return QuestionKind::TrueFalseSet;
    }

    let text = key.and_then(|k| match k {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("text").and_then(Value::as_str),
        _ => None,
    });
    if text.is_some_and(|t| !is_purely_numeric(t)) {
        return QuestionKind::Essay;
    }

    QuestionKind::SingleChoice
}

/// The legacy answer key, under either spelling.
pub(crate) fn answer_key_of(raw: &Value) -> Option<&Value> {
    field(raw, &["answerKey", "answer_key"]).filter(|v| !v.is_null())
}

pub(crate) fn field<'a>(raw: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| raw.get(*name))
}

fn is_purely_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

//! Upgrade of legacy question records into canonical [`Question`]s.
//!
//! Legacy records are JSON objects with an `id`, a `prompt` (or `question`),
//! optional `options`, `matchingRightOptions` and `weight`, and an answer key
//! whose shape depends on the kind. The kind is read from an explicit `kind`
//! or `type` tag when present and inferred with
//! [`classify_legacy_question`] otherwise.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::classify::{answer_key_of, classify_legacy_question, field};
use crate::error::LegacyError;
use crate::model::{default_weight, AnswerKey, Question, QuestionKind};

/// Convert one legacy record into a validated canonical question.
pub fn upgrade_legacy_question(raw: &Value) -> Result<Question, LegacyError> {
    if !raw.is_object() {
        return Err(LegacyError::NotAnObject);
    }

    let id = match raw.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(LegacyError::MissingId),
    };

    let prompt = field(raw, &["prompt", "question"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| LegacyError::MissingPrompt(id.clone()))?
        .to_string();

    let kind = explicit_kind(raw).unwrap_or_else(|| classify_legacy_question(raw));
    let weight = raw
        .get("weight")
        .and_then(Value::as_f64)
        .unwrap_or_else(default_weight);

    let answer_key = coerce_answer_key(kind, answer_key_of(raw)).ok_or_else(|| {
        LegacyError::UnreadableAnswerKey {
            id: id.clone(),
            kind,
        }
    })?;

    let question = Question {
        id,
        kind,
        prompt,
        weight,
        options: text_list(field(raw, &["options"])),
        matching_right_options: text_list(field(
            raw,
            &["matchingRightOptions", "matching_right_options"],
        )),
        answer_key,
    };

    question.validate().map_err(|source| LegacyError::Invalid {
        id: question.id.clone(),
        source,
    })?;
    Ok(question)
}

fn explicit_kind(raw: &Value) -> Option<QuestionKind> {
    let tag = field(raw, &["kind", "type"]).and_then(Value::as_str)?;
    match tag.parse() {
        Ok(kind) => Some(kind),
        Err(e) => {
            tracing::debug!(tag, error = %e, "ignoring unrecognized legacy kind tag");
            None
        }
    }
}

fn coerce_answer_key(kind: QuestionKind, key: Option<&Value>) -> Option<AnswerKey> {
    match kind {
        QuestionKind::SingleChoice => {
            let index = match key? {
                Value::Object(map) => map.get("index").and_then(as_index),
                Value::String(s) => s.trim().parse().ok(),
                other => as_index(other),
            }?;
            Some(AnswerKey::SingleChoice { index })
        }
        QuestionKind::MultiChoice => {
            let list = match key? {
                Value::Object(map) => map.get("indices")?,
                other => other,
            };
            let indices = list
                .as_array()?
                .iter()
                .map(as_index)
                .collect::<Option<BTreeSet<_>>>()?;
            Some(AnswerKey::MultiChoice { indices })
        }
        QuestionKind::Matching => {
            let map = nested_object(key?, "pairs")?;
            let pairs = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let right = u32::try_from(v.as_u64()?).ok()?;
                    Some((k.trim().parse().ok()?, right))
                })
                .collect::<Option<BTreeMap<_, _>>>()?;
            Some(AnswerKey::Matching { pairs })
        }
        QuestionKind::TrueFalseSet => {
            let map = nested_object(key?, "perStatement")?;
            let per_statement = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| Some((k.trim().parse().ok()?, v.as_bool()?)))
                .collect::<Option<BTreeMap<_, _>>>()?;
            Some(AnswerKey::TrueFalseSet { per_statement })
        }
        QuestionKind::Essay => {
            let expected_text = match key {
                None => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Object(map)) => map
                    .get("expectedText")
                    .or_else(|| map.get("text"))
                    .and_then(Value::as_str)?
                    .to_string(),
                Some(_) => return None,
            };
            Some(AnswerKey::Essay { expected_text })
        }
    }
}

/// `{ "<name>": {..} }` or the object itself.
fn nested_object<'a>(key: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    let map = key.as_object()?;
    match map.get(name) {
        Some(inner) => inner.as_object(),
        None => Some(map),
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|i| usize::try_from(i).ok())
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

//! Core data model types for examkey.
//!
//! A [`Question`] pairs display data with an [`AnswerKey`], a closed sum type
//! with one variant per [`QuestionKind`]. Learner input arrives as an
//! [`Answer`] whose value mirrors the key shape, and scoring produces a
//! [`ScoreResult`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// The five supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    Matching,
    TrueFalseSet,
    Essay,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 5] = [
        QuestionKind::SingleChoice,
        QuestionKind::MultiChoice,
        QuestionKind::Matching,
        QuestionKind::TrueFalseSet,
        QuestionKind::Essay,
    ];

    /// The type token used by import files (`SINGLE`, `MULTIPLE`, ...).
    pub fn token(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "SINGLE",
            QuestionKind::MultiChoice => "MULTIPLE",
            QuestionKind::Matching => "MATCHING",
            QuestionKind::TrueFalseSet => "TRUE_FALSE",
            QuestionKind::Essay => "ESSAY",
        }
    }

    /// Parse an import type token. Case, surrounding brackets, and
    /// `-`/space separators are ignored.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = token
            .trim()
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')'])
            .trim()
            .to_uppercase()
            .replace(['-', ' '], "_");
        match normalized.as_str() {
            "SINGLE" => Some(QuestionKind::SingleChoice),
            "MULTIPLE" => Some(QuestionKind::MultiChoice),
            "MATCHING" => Some(QuestionKind::Matching),
            "TRUE_FALSE" | "TRUEFALSE" => Some(QuestionKind::TrueFalseSet),
            "ESSAY" => Some(QuestionKind::Essay),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::SingleChoice => write!(f, "SingleChoice"),
            QuestionKind::MultiChoice => write!(f, "MultiChoice"),
            QuestionKind::Matching => write!(f, "Matching"),
            QuestionKind::TrueFalseSet => write!(f, "TrueFalseSet"),
            QuestionKind::Essay => write!(f, "Essay"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = QuestionKind::from_token(s) {
            return Ok(kind);
        }
        match s.trim().to_lowercase().as_str() {
            "singlechoice" => Ok(QuestionKind::SingleChoice),
            "multichoice" => Ok(QuestionKind::MultiChoice),
            "truefalseset" => Ok(QuestionKind::TrueFalseSet),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// The correct-answer data of a question, one shape per kind.
///
/// Matching ids are 1-based positions: left ids index `options`, right ids
/// index `matching_right_options`. Inserting the same left id twice keeps
/// the last right id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnswerKey {
    SingleChoice {
        index: usize,
    },
    MultiChoice {
        indices: BTreeSet<usize>,
    },
    Matching {
        #[serde(with = "keyed_map")]
        pairs: BTreeMap<u32, u32>,
    },
    TrueFalseSet {
        #[serde(rename = "perStatement", with = "keyed_map")]
        per_statement: BTreeMap<usize, bool>,
    },
    Essay {
        #[serde(rename = "expectedText", default)]
        expected_text: String,
    },
}

impl AnswerKey {
    /// The kind this key variant belongs to.
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::SingleChoice { .. } => QuestionKind::SingleChoice,
            AnswerKey::MultiChoice { .. } => QuestionKind::MultiChoice,
            AnswerKey::Matching { .. } => QuestionKind::Matching,
            AnswerKey::TrueFalseSet { .. } => QuestionKind::TrueFalseSet,
            AnswerKey::Essay { .. } => QuestionKind::Essay,
        }
    }
}

/// One assessable item of a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within a test.
    pub id: String,
    pub kind: QuestionKind,
    /// Rich text, opaque to scoring.
    #[serde(default)]
    pub prompt: String,
    /// Relative contribution to the aggregate score.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Choice text, matching left items, or true/false statements.
    #[serde(default)]
    pub options: Vec<String>,
    /// Right-hand items of a matching question.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matching_right_options: Vec<String>,
    pub answer_key: AnswerKey,
}

impl Question {
    /// Check that the answer key fits the kind and the item lists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_answer_key(
            self.kind,
            self.weight,
            &self.options,
            &self.matching_right_options,
            &self.answer_key,
        )
    }
}

/// A canonical question that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub kind: QuestionKind,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matching_right_options: Vec<String>,
    pub answer_key: AnswerKey,
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_answer_key(
            self.kind,
            self.weight,
            &self.options,
            &self.matching_right_options,
            &self.answer_key,
        )
    }

    /// Attach a persistence-assigned id.
    pub fn into_question(self, id: impl Into<String>) -> Question {
        Question {
            id: id.into(),
            kind: self.kind,
            prompt: self.prompt,
            weight: self.weight,
            options: self.options,
            matching_right_options: self.matching_right_options,
            answer_key: self.answer_key,
        }
    }
}

pub(crate) fn default_weight() -> f64 {
    1.0
}

/// Validate a question before it is persisted or scored.
pub fn validate_question(question: &Question) -> Result<(), ValidationError> {
    question.validate()
}

fn check_answer_key(
    kind: QuestionKind,
    weight: f64,
    options: &[String],
    right_options: &[String],
    key: &AnswerKey,
) -> Result<(), ValidationError> {
    if key.kind() != kind {
        return Err(ValidationError::KindMismatch {
            expected: kind,
            found: key.kind(),
        });
    }
    if !(weight.is_finite() && weight > 0.0) {
        return Err(ValidationError::InvalidWeight(weight));
    }
    if kind != QuestionKind::Matching && !right_options.is_empty() {
        return Err(ValidationError::UnexpectedItems {
            kind,
            field: "matching right options",
        });
    }

    let len = options.len();
    match key {
        AnswerKey::SingleChoice { index } => {
            if *index >= len {
                return Err(ValidationError::OptionOutOfRange { index: *index, len });
            }
        }
        AnswerKey::MultiChoice { indices } => {
            if indices.is_empty() {
                return Err(ValidationError::EmptyChoiceSet);
            }
            if let Some(&index) = indices.iter().find(|&&i| i >= len) {
                return Err(ValidationError::OptionOutOfRange { index, len });
            }
        }
        AnswerKey::Matching { pairs } => {
            for (&left, &right) in pairs {
                if left == 0 || left as usize > len {
                    return Err(ValidationError::LeftItemOutOfRange { id: left, len });
                }
                if right == 0 || right as usize > right_options.len() {
                    return Err(ValidationError::RightItemOutOfRange {
                        id: right,
                        len: right_options.len(),
                    });
                }
            }
        }
        AnswerKey::TrueFalseSet { per_statement } => {
            if let Some(&index) = per_statement.keys().find(|&&i| i >= len) {
                return Err(ValidationError::StatementOutOfRange { index, len });
            }
            if let Some(missing) = (0..len).find(|i| !per_statement.contains_key(i)) {
                return Err(ValidationError::MissingStatement(missing));
            }
        }
        AnswerKey::Essay { .. } => {
            if !options.is_empty() {
                return Err(ValidationError::UnexpectedItems {
                    kind,
                    field: "options",
                });
            }
        }
    }
    Ok(())
}

/// A learner's submitted value, shaped like the matching answer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(usize),
    Choices(BTreeSet<usize>),
    Pairs(BTreeMap<u32, u32>),
    Statements(BTreeMap<usize, bool>),
    Text(String),
}

impl AnswerValue {
    /// Read a stored JSON value. Shapes that fit no variant yield `None`;
    /// null entries inside an object are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => as_index(value).map(AnswerValue::Choice),
            Value::String(s) => Some(AnswerValue::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(as_index)
                .collect::<Option<BTreeSet<_>>>()
                .map(AnswerValue::Choices),
            Value::Object(map) => {
                let entries: Vec<(&String, &Value)> =
                    map.iter().filter(|(_, v)| !v.is_null()).collect();
                if entries.is_empty() {
                    None
                } else if entries.iter().all(|(_, v)| v.is_boolean()) {
                    entries
                        .iter()
                        .map(|(k, v)| Some((k.trim().parse().ok()?, v.as_bool()?)))
                        .collect::<Option<BTreeMap<_, _>>>()
                        .map(AnswerValue::Statements)
                } else {
                    entries
                        .iter()
                        .map(|(k, v)| {
                            let right = u32::try_from(v.as_u64()?).ok()?;
                            Some((k.trim().parse().ok()?, right))
                        })
                        .collect::<Option<BTreeMap<_, _>>>()
                        .map(AnswerValue::Pairs)
                }
            }
            Value::Null | Value::Bool(_) => None,
        }
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|i| usize::try_from(i).ok())
}

/// A learner's answer to one question.
///
/// `value == None` means unanswered. `unsure` is a UI flag and never affects
/// the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Answer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AnswerValue>,
    #[serde(default)]
    pub unsure: bool,
}

impl Answer {
    pub fn new(value: AnswerValue) -> Self {
        Self {
            value: Some(value),
            unsure: false,
        }
    }

    pub fn unanswered() -> Self {
        Self::default()
    }
}

impl From<AnswerValue> for Answer {
    fn from(value: AnswerValue) -> Self {
        Answer::new(value)
    }
}

impl<'de> Deserialize<'de> for Answer {
    /// Accepts `{ "value": .., "unsure": .. }` or a bare value. Anything
    /// unreadable becomes an unanswered answer instead of an error.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let wrapped = raw
            .as_object()
            .filter(|map| map.contains_key("value") || map.contains_key("unsure"));
        let answer = match wrapped {
            Some(map) => Answer {
                value: map.get("value").and_then(AnswerValue::from_json),
                unsure: map.get("unsure").and_then(Value::as_bool).unwrap_or(false),
            },
            None => Answer {
                value: AnswerValue::from_json(&raw),
                unsure: false,
            },
        };
        Ok(answer)
    }
}

/// The aggregate score of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub raw_points: f64,
    pub max_points: f64,
    /// `round(raw / max * 100)`, or 0 when `max_points` is 0.
    pub percentage: u8,
}

impl ScoreResult {
    pub fn new(raw_points: f64, max_points: f64) -> Self {
        let percentage = if max_points > 0.0 {
            (raw_points / max_points * 100.0).round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
        Self {
            raw_points,
            max_points,
            percentage,
        }
    }
}

/// Serde adapter for integer-keyed maps. Keys are written as strings so the
/// same data round-trips through TOML and JSON.
mod keyed_map {
    use std::collections::BTreeMap;
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Display,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: FromStr + Ord,
        K::Err: Display,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| match k.trim().parse::<K>() {
                Ok(key) => Ok((key, v)),
                Err(e) => Err(D::Error::custom(format!("invalid key '{k}': {e}"))),
            })
            .collect()
    }
}

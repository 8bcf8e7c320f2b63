//! Weighted scoring of learner submissions.
//!
//! Each question contributes between `0` and its weight:
//!
//! - single and multiple choice are all-or-nothing (a multiple-choice answer
//!   must equal the key set exactly)
//! - matching and true/false sets give partial credit per correct pair or
//!   statement
//! - essays match on trimmed, case-folded text
//!
//! Malformed or missing learner answers score zero. A question whose answer
//! key fails validation aborts the whole call.

use std::collections::{HashMap, HashSet};

use crate::error::ScoringError;
use crate::model::{Answer, AnswerKey, AnswerValue, Question, ScoreResult};

/// Score one learner's answers against a test.
///
/// `max_points` counts every question's weight, answered or not.
pub fn score_submission(
    questions: &[Question],
    answers: &HashMap<String, Answer>,
) -> Result<ScoreResult, ScoringError> {
    validate_questions(questions)?;
    Ok(score_validated(questions, answers))
}

/// Check every question of a test, in order: its answer key must be valid
/// and its id must not repeat an earlier one.
pub fn validate_questions(questions: &[Question]) -> Result<(), ScoringError> {
    let mut seen = HashSet::new();
    for question in questions {
        question
            .validate()
            .map_err(|source| ScoringError::InvalidQuestion {
                question_id: question.id.clone(),
                source,
            })?;
        if !seen.insert(question.id.as_str()) {
            return Err(ScoringError::DuplicateQuestionId(question.id.clone()));
        }
    }
    Ok(())
}

/// Score answers against questions that have already passed validation,
/// for callers that score many submissions against the same test.
pub fn score_validated(questions: &[Question], answers: &HashMap<String, Answer>) -> ScoreResult {
    let mut raw_points = 0.0;
    let mut max_points = 0.0;
    for question in questions {
        max_points += question.weight;
        raw_points += question_points(question, answers.get(&question.id));
    }
    ScoreResult::new(raw_points, max_points)
}

/// Alias of [`score_submission`].
pub fn score(
    questions: &[Question],
    answers: &HashMap<String, Answer>,
) -> Result<ScoreResult, ScoringError> {
    score_submission(questions, answers)
}

/// Points earned on a single, already validated question.
pub fn question_points(question: &Question, answer: Option<&Answer>) -> f64 {
    let Some(value) = answer.and_then(|a| a.value.as_ref()) else {
        return 0.0;
    };
    let weight = question.weight;

    match (&question.answer_key, value) {
        (AnswerKey::SingleChoice { index }, AnswerValue::Choice(given)) => {
            if given == index {
                weight
            } else {
                0.0
            }
        }
        (AnswerKey::MultiChoice { indices }, AnswerValue::Choices(given)) => {
            if given == indices {
                weight
            } else {
                0.0
            }
        }
        (AnswerKey::Matching { pairs }, AnswerValue::Pairs(given)) => {
            let correct = pairs
                .iter()
                .filter(|(left, right)| given.get(left) == Some(right))
                .count();
            partial(weight, correct, pairs.len())
        }
        (AnswerKey::TrueFalseSet { per_statement }, AnswerValue::Statements(given)) => {
            let correct = per_statement
                .iter()
                .filter(|(index, truth)| given.get(index) == Some(truth))
                .count();
            partial(weight, correct, per_statement.len())
        }
        (AnswerKey::Essay { expected_text }, AnswerValue::Text(given)) => {
            let given = fold_text(given);
            if !given.is_empty() && given == fold_text(expected_text) {
                weight
            } else {
                0.0
            }
        }
        _ => {
            tracing::debug!(
                question = %question.id,
                kind = %question.kind,
                "answer shape does not match question kind, scoring as unanswered"
            );
            0.0
        }
    }
}

fn partial(weight: f64, correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    if correct >= total {
        return weight;
    }
    weight * (correct as f64 / total as f64)
}

fn fold_text(text: &str) -> String {
    text.trim().to_lowercase()
}

//! Batch scoring engine.
//!
//! Scores many learner submissions against one question bank with bounded
//! parallelism. Scoring itself is a pure CPU-bound call and runs on the
//! blocking pool; every result is handed to a [`ScoreStore`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use examkey_core::model::{Answer, ScoreResult};
use examkey_core::scoring::{score_validated, validate_questions};

use crate::bank::QuestionBank;
use crate::report::{BankSummary, BatchReport, BatchSummary, SubmissionFailure, SubmissionScore};
use crate::traits::ScoreStore;

/// Configuration for the batch scorer.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum submissions scored concurrently.
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// One learner's answers to a test, keyed by question id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub submission_id: String,
    #[serde(default)]
    pub answers: HashMap<String, Answer>,
}

/// Read a JSON array of submissions.
pub fn load_submissions(path: &Path) -> Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submissions: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse submissions JSON: {}", path.display()))
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_scored(&self, submission_id: &str, result: &ScoreResult);
    fn on_submission_failed(&self, submission_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, scored: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_scored(&self, _: &str, _: &ScoreResult) {}
    fn on_submission_failed(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

pub struct BatchScorer {
    config: BatchConfig,
}

impl BatchScorer {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Score every submission against `bank`.
    ///
    /// Fails before scoring anything if a question in the bank is
    /// misconfigured, two questions share an id, or a submission id repeats. A submission whose score cannot be stored is recorded
    /// as failed and the batch carries on.
    pub async fn score_all(
        &self,
        bank: &QuestionBank,
        submissions: Vec<Submission>,
        store: Arc<dyn ScoreStore>,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        validate_questions(&bank.questions)
            .with_context(|| format!("bank '{}' cannot be scored", bank.id))?;
        check_unique_submissions(&submissions)?;

        tracing::info!(
            bank = %bank.id,
            submissions = submissions.len(),
            parallelism = self.config.parallelism,
            "scoring batch"
        );

        let questions = Arc::new(bank.questions.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for submission in submissions {
            let questions = Arc::clone(&questions);
            let semaphore = Arc::clone(&semaphore);
            let store = Arc::clone(&store);

            futures.push(async move {
                let Submission {
                    submission_id,
                    answers,
                } = submission;
                let inner = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

                    let result =
                        tokio::task::spawn_blocking(move || score_validated(&questions, &answers))
                            .await
                            .context("scoring task panicked")?;

                    store
                        .save_score(&submission_id, &result)
                        .await
                        .context("failed to store score")?;
                    Ok::<_, anyhow::Error>(result)
                };
                let result = inner.await;
                (submission_id, result)
            });
        }

        let total = futures.len();
        let mut results = Vec::new();
        let mut failures = Vec::new();

        while let Some((submission_id, result)) = futures.next().await {
            match result {
                Ok(score) => {
                    progress.on_submission_scored(&submission_id, &score);
                    results.push(SubmissionScore {
                        submission_id,
                        score,
                    });
                }
                Err(e) => {
                    tracing::warn!("submission {submission_id} failed: {e:#}");
                    progress.on_submission_failed(&submission_id, &format!("{e:#}"));
                    failures.push(SubmissionFailure {
                        submission_id,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        results.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));
        failures.sort_by(|a, b| a.submission_id.cmp(&b.submission_id));

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, results.len(), failures.len(), elapsed);
        tracing::info!(
            scored = results.len(),
            failed = failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch complete"
        );

        let summary = BatchSummary::from_results(&results, failures.len());

        Ok(BatchReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            bank: BankSummary {
                id: bank.id.clone(),
                name: bank.name.clone(),
                question_count: bank.questions.len(),
                max_points: bank.max_points(),
            },
            results,
            failures,
            summary,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Reports and stores key scores by submission id, so an id may appear once.
fn check_unique_submissions(submissions: &[Submission]) -> Result<()> {
    let mut seen = HashSet::new();
    for submission in submissions {
        if !seen.insert(submission.submission_id.as_str()) {
            anyhow::bail!(
                "submission '{}' appears more than once in the batch",
                submission.submission_id
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use examkey_core::model::{AnswerKey, AnswerValue, Question, QuestionKind};

    use crate::traits::{MemoryStore, NoopStore};

    fn bank() -> QuestionBank {
        QuestionBank {
            id: "b".into(),
            name: "Bank".into(),
            description: String::new(),
            questions: vec![
                Question {
                    id: "q1".into(),
                    kind: QuestionKind::SingleChoice,
                    prompt: "Pick".into(),
                    weight: 1.0,
                    options: vec!["a".into(), "b".into()],
                    matching_right_options: vec![],
                    answer_key: AnswerKey::SingleChoice { index: 1 },
                },
                Question {
                    id: "q2".into(),
                    kind: QuestionKind::TrueFalseSet,
                    prompt: "Judge".into(),
                    weight: 3.0,
                    options: vec!["s1".into(), "s2".into(), "s3".into()],
                    matching_right_options: vec![],
                    answer_key: AnswerKey::TrueFalseSet {
                        per_statement: [(0, true), (1, false), (2, true)].into_iter().collect(),
                    },
                },
            ],
        }
    }

    fn submission(id: &str, choice: usize, statements: &[(usize, bool)]) -> Submission {
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), Answer::new(AnswerValue::Choice(choice)));
        answers.insert(
            "q2".to_string(),
            Answer::new(AnswerValue::Statements(statements.iter().copied().collect())),
        );
        Submission {
            submission_id: id.into(),
            answers,
        }
    }

    struct CountingReporter {
        scored: AtomicUsize,
        failed: AtomicUsize,
    }

    impl ProgressReporter for CountingReporter {
        fn on_submission_scored(&self, _: &str, _: &ScoreResult) {
            self.scored.fetch_add(1, Ordering::SeqCst);
        }
        fn on_submission_failed(&self, _: &str, _: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    /// Refuses to store one particular submission.
    struct RejectingStore {
        reject: &'static str,
    }

    #[async_trait]
    impl ScoreStore for RejectingStore {
        async fn save_score(&self, submission_id: &str, _: &ScoreResult) -> Result<()> {
            if submission_id == self.reject {
                anyhow::bail!("database unavailable");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn scores_every_submission_sorted_by_id() {
        let store = Arc::new(MemoryStore::new());
        let submissions = vec![
            submission("c", 1, &[(0, true), (1, false), (2, true)]),
            submission("a", 0, &[(0, true)]),
            submission("b", 1, &[]),
        ];
        let scorer = BatchScorer::new(BatchConfig { parallelism: 2 });
        let report = scorer
            .score_all(&bank(), submissions, store.clone(), &NoopReporter)
            .await
            .unwrap();

        let ids: Vec<_> = report.results.iter().map(|r| r.submission_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(report.results[0].score.raw_points, 1.0);
        assert_eq!(report.results[1].score.percentage, 25);
        assert_eq!(report.results[2].score.percentage, 100);
        assert_eq!(report.bank.max_points, 4.0);
        assert_eq!(report.summary.submissions, 3);
        assert_eq!(report.summary.highest, Some(100));
        assert_eq!(store.scores().await.len(), 3);
    }

    #[tokio::test]
    async fn invalid_bank_fails_before_scoring() {
        let mut bank = bank();
        bank.questions[0].answer_key = AnswerKey::SingleChoice { index: 9 };
        let store = Arc::new(MemoryStore::new());

        let err = BatchScorer::new(BatchConfig::default())
            .score_all(&bank, vec![submission("a", 1, &[])], store.clone(), &NoopReporter)
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("bank 'b' cannot be scored"));
        assert!(message.contains("q1"));
        assert!(store.scores().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_question_id_fails_before_scoring() {
        let mut bank = bank();
        let mut twin = bank.questions[0].clone();
        twin.answer_key = AnswerKey::SingleChoice { index: 0 };
        bank.questions.push(twin);
        let store = Arc::new(MemoryStore::new());

        let err = BatchScorer::new(BatchConfig::default())
            .score_all(&bank, vec![submission("a", 1, &[])], store.clone(), &NoopReporter)
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("bank 'b' cannot be scored"));
        assert!(message.contains("question id 'q1' is used more than once"));
        assert!(store.scores().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_submission_id_fails_before_scoring() {
        let store = Arc::new(MemoryStore::new());
        let submissions = vec![
            submission("a", 1, &[]),
            submission("b", 1, &[]),
            submission("a", 0, &[]),
        ];

        let err = BatchScorer::new(BatchConfig::default())
            .score_all(&bank(), submissions, store.clone(), &NoopReporter)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("submission 'a' appears more than once"));
        assert!(store.scores().await.is_empty());
    }

    #[tokio::test]
    async fn store_failure_marks_submission_failed() {
        let reporter = CountingReporter {
            scored: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };
        let submissions = vec![submission("a", 1, &[]), submission("b", 1, &[])];
        let report = BatchScorer::new(BatchConfig { parallelism: 1 })
            .score_all(
                &bank(),
                submissions,
                Arc::new(RejectingStore { reject: "b" }),
                &reporter,
            )
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].submission_id, "b");
        assert!(report.failures[0].error.contains("database unavailable"));
        assert_eq!(report.summary.failed, 1);
        assert_eq!(reporter.scored.load(Ordering::SeqCst), 1);
        assert_eq!(reporter.failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch() {
        let report = BatchScorer::new(BatchConfig::default())
            .score_all(&bank(), vec![], Arc::new(NoopStore), &NoopReporter)
            .await
            .unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.summary.mean_percentage, 0.0);
    }

    #[tokio::test]
    async fn rescoring_unchanged_data_has_no_changes() {
        let submissions = vec![
            submission("a", 1, &[(0, true), (1, true)]),
            submission("b", 0, &[(2, true)]),
        ];
        let scorer = BatchScorer::new(BatchConfig::default());
        let first = scorer
            .score_all(&bank(), submissions.clone(), Arc::new(NoopStore), &NoopReporter)
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        first.save_json(&path).unwrap();
        let baseline = BatchReport::load_json(&path).unwrap();

        let second = scorer
            .score_all(&bank(), submissions, Arc::new(NoopStore), &NoopReporter)
            .await
            .unwrap();
        let diff = second.compare(&baseline);
        assert!(!diff.has_changes());
        assert_eq!(diff.unchanged, 2);
    }

    #[test]
    fn submission_json_shape() {
        let json = r#"{"submissionId": "s1", "answers": {"q1": 1, "q2": {"value": {"0": true}, "unsure": true}}}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.submission_id, "s1");
        assert_eq!(
            submission.answers["q1"].value,
            Some(AnswerValue::Choice(1))
        );
        assert!(submission.answers["q2"].unsure);
    }
}

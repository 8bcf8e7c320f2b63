//! Persistence seam for batch scoring.
//!
//! The engine hands every computed score to a [`ScoreStore`]; the platform
//! database is one implementation, the stores below cover the CLI and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use examkey_core::model::ScoreResult;

/// Destination for computed scores.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist the score of one submission.
    async fn save_score(&self, submission_id: &str, result: &ScoreResult) -> Result<()>;
}

/// Discards every score.
pub struct NoopStore;

#[async_trait]
impl ScoreStore for NoopStore {
    async fn save_score(&self, _: &str, _: &ScoreResult) -> Result<()> {
        Ok(())
    }
}

/// Keeps scores in memory, keyed by submission id.
#[derive(Default)]
pub struct MemoryStore {
    scores: Mutex<BTreeMap<String, ScoreResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far.
    pub async fn scores(&self) -> BTreeMap<String, ScoreResult> {
        self.scores.lock().await.clone()
    }

    pub async fn get(&self, submission_id: &str) -> Option<ScoreResult> {
        self.scores.lock().await.get(submission_id).copied()
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn save_score(&self, submission_id: &str, result: &ScoreResult) -> Result<()> {
        self.scores
            .lock()
            .await
            .insert(submission_id.to_string(), *result);
        Ok(())
    }
}

/// One line of a [`JsonLinesStore`] file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScore {
    pub submission_id: String,
    #[serde(flatten)]
    pub result: ScoreResult,
}

/// Appends one JSON object per score to a file.
pub struct JsonLinesStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesStore {
    /// Append to `path`, creating it if needed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Start a fresh file at `path`, truncating any previous content.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, "")
            .with_context(|| format!("failed to create score file {}", path.display()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every line of a score file.
    pub fn read_all(path: &Path) -> Result<Vec<StoredScore>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read score file {}", path.display()))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("invalid score on line {} of {}", i + 1, path.display())
                })
            })
            .collect()
    }
}

#[async_trait]
impl ScoreStore for JsonLinesStore {
    async fn save_score(&self, submission_id: &str, result: &ScoreResult) -> Result<()> {
        let record = StoredScore {
            submission_id: submission_id.to_string(),
            result: *result,
        };
        let mut line = serde_json::to_string(&record).context("failed to serialize score")?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

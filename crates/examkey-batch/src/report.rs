//! Batch report types with JSON persistence and re-score comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use examkey_core::model::ScoreResult;

/// A complete batch scoring report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The bank the submissions were scored against.
    pub bank: BankSummary,
    /// Scored submissions, sorted by submission id.
    pub results: Vec<SubmissionScore>,
    /// Submissions whose score could not be stored.
    #[serde(default)]
    pub failures: Vec<SubmissionFailure>,
    pub summary: BatchSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a question bank (without the questions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub max_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionScore {
    pub submission_id: String,
    pub score: ScoreResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFailure {
    pub submission_id: String,
    pub error: String,
}

/// Descriptive totals over one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Submissions handed to the batch, scored or failed.
    pub submissions: usize,
    pub failed: usize,
    /// Mean percentage over scored submissions; 0 when none were scored.
    pub mean_percentage: f64,
    pub highest: Option<u8>,
    pub lowest: Option<u8>,
}

impl BatchSummary {
    pub fn from_results(results: &[SubmissionScore], failed: usize) -> Self {
        let percentages: Vec<u8> = results.iter().map(|r| r.score.percentage).collect();
        let mean_percentage = if percentages.is_empty() {
            0.0
        } else {
            percentages.iter().map(|&p| f64::from(p)).sum::<f64>() / percentages.len() as f64
        };
        Self {
            submissions: results.len() + failed,
            failed,
            mean_percentage,
            highest: percentages.iter().copied().max(),
            lowest: percentages.iter().copied().min(),
        }
    }
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this (re-scored) report against a baseline.
    pub fn compare(&self, baseline: &BatchReport) -> RescoreReport {
        // Keyed by (id, occurrence): repeated ids are compared entry by entry.
        let score_map = |report: &BatchReport| -> BTreeMap<(String, usize), ScoreResult> {
            let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
            report
                .results
                .iter()
                .map(|r| {
                    let n = occurrences.entry(r.submission_id.as_str()).or_insert(0);
                    *n += 1;
                    ((r.submission_id.clone(), *n - 1), r.score)
                })
                .collect()
        };

        let baseline_scores = score_map(baseline);
        let current_scores = score_map(self);

        let mut changes = Vec::new();
        let mut unchanged = 0usize;
        let mut new_submissions = Vec::new();

        for (key, current) in &current_scores {
            let id = &key.0;
            match baseline_scores.get(key) {
                Some(before) if same_score(before, current) => unchanged += 1,
                Some(before) => changes.push(ScoreChange {
                    submission_id: id.clone(),
                    baseline: *before,
                    current: *current,
                    delta: i16::from(current.percentage) - i16::from(before.percentage),
                }),
                None => new_submissions.push(id.clone()),
            }
        }

        let removed_submissions = baseline_scores
            .keys()
            .filter(|key| !current_scores.contains_key(*key))
            .map(|(id, _)| id.clone())
            .collect();

        RescoreReport {
            changes,
            unchanged,
            new_submissions,
            removed_submissions,
        }
    }
}

/// Scores read back from JSON may differ from freshly computed ones in the
/// last bit, so points are compared with a small tolerance.
fn same_score(a: &ScoreResult, b: &ScoreResult) -> bool {
    const EPSILON: f64 = 1e-9;
    a.percentage == b.percentage
        && (a.raw_points - b.raw_points).abs() < EPSILON
        && (a.max_points - b.max_points).abs() < EPSILON
}

/// Result of comparing a re-score against a baseline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescoreReport {
    /// Submissions whose score differs, sorted by submission id.
    pub changes: Vec<ScoreChange>,
    pub unchanged: usize,
    /// Submissions in the re-score but not the baseline.
    pub new_submissions: Vec<String>,
    /// Submissions in the baseline but not the re-score.
    pub removed_submissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub submission_id: String,
    pub baseline: ScoreResult,
    pub current: ScoreResult,
    /// Percentage points gained (negative when lost).
    pub delta: i16,
}

impl RescoreReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} changed, {} unchanged, {} new, {} removed\n\n",
            self.changes.len(),
            self.unchanged,
            self.new_submissions.len(),
            self.removed_submissions.len()
        ));

        if !self.changes.is_empty() {
            md.push_str("### Changed scores\n\n");
            md.push_str("| Submission | Baseline | Current | Delta |\n");
            md.push_str("|------------|----------|---------|-------|\n");
            for c in &self.changes {
                md.push_str(&format!(
                    "| {} | {}% ({}/{}) | {}% ({}/{}) | {:+} |\n",
                    c.submission_id,
                    c.baseline.percentage,
                    c.baseline.raw_points,
                    c.baseline.max_points,
                    c.current.percentage,
                    c.current.raw_points,
                    c.current.max_points,
                    c.delta
                ));
            }
            md.push('\n');
        }

        if !self.new_submissions.is_empty() {
            md.push_str(&format!(
                "**New:** {}\n\n",
                self.new_submissions.join(", ")
            ));
        }
        if !self.removed_submissions.is_empty() {
            md.push_str(&format!(
                "**Removed:** {}\n",
                self.removed_submissions.join(", ")
            ));
        }

        md
    }

    /// Returns true if any score changed.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

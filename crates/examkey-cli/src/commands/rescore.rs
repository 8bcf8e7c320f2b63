//! The `examkey rescore` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use examkey_batch::bank::parse_bank;
use examkey_batch::config::load_config_from;
use examkey_batch::engine::{load_submissions, BatchConfig, BatchScorer, NoopReporter};
use examkey_batch::report::BatchReport;
use examkey_batch::traits::NoopStore;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    bank_path: PathBuf,
    submissions_path: PathBuf,
    baseline_path: PathBuf,
    format: String,
    fail_on_change: bool,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let baseline = BatchReport::load_json(&baseline_path)?;
    let bank = parse_bank(&bank_path)?;
    let submissions = load_submissions(&submissions_path)?;

    if baseline.bank.id != bank.id {
        tracing::warn!(
            "baseline was scored against bank '{}', re-scoring against '{}'",
            baseline.bank.id,
            bank.id
        );
    }

    let scorer = BatchScorer::new(BatchConfig { parallelism });
    let current = scorer
        .score_all(&bank, submissions, Arc::new(NoopStore), &NoopReporter)
        .await?;

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Re-score: {} changed, {} unchanged",
                report.changes.len(),
                report.unchanged
            );

            if !report.changes.is_empty() {
                println!("\nChanged:");
                for c in &report.changes {
                    println!(
                        "  {} {}% ({}/{}) -> {}% ({}/{}) ({:+})",
                        c.submission_id,
                        c.baseline.percentage,
                        c.baseline.raw_points,
                        c.baseline.max_points,
                        c.current.percentage,
                        c.current.raw_points,
                        c.current.max_points,
                        c.delta
                    );
                }
            }

            if !report.new_submissions.is_empty() {
                println!("\n{} new submission(s)", report.new_submissions.len());
            }
            if !report.removed_submissions.is_empty() {
                println!("{} removed submission(s)", report.removed_submissions.len());
            }
        }
    }

    if fail_on_change && report.has_changes() {
        std::process::exit(1);
    }

    Ok(())
}

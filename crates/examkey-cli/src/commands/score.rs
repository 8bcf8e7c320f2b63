//! The `examkey score` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use examkey_batch::bank::parse_bank;
use examkey_batch::config::load_config_from;
use examkey_batch::engine::{load_submissions, BatchConfig, BatchScorer, ProgressReporter};
use examkey_batch::report::BatchReport;
use examkey_batch::traits::{JsonLinesStore, NoopStore, ScoreStore};
use examkey_core::model::ScoreResult;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_scored(&self, submission_id: &str, result: &ScoreResult) {
        eprintln!(
            "  Scored: {submission_id} {}/{} ({}%)",
            result.raw_points, result.max_points, result.percentage
        );
    }

    fn on_submission_failed(&self, submission_id: &str, error: &str) {
        eprintln!("  ERROR: {submission_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, scored: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {scored}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    bank_path: PathBuf,
    submissions_path: PathBuf,
    output: Option<PathBuf>,
    persist: Option<PathBuf>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let bank = parse_bank(&bank_path)?;
    let submissions = load_submissions(&submissions_path)?;

    let store: Arc<dyn ScoreStore> = match &persist {
        Some(path) => Arc::new(JsonLinesStore::create(path)?),
        None => Arc::new(NoopStore),
    };

    eprintln!(
        "examkey v{} - Scoring {} submissions against {} ({} questions)",
        env!("CARGO_PKG_VERSION"),
        submissions.len(),
        bank.id,
        bank.questions.len()
    );
    eprintln!();

    let scorer = BatchScorer::new(BatchConfig { parallelism });
    let report = scorer
        .score_all(&bank, submissions, store, &ConsoleReporter)
        .await?;

    print_summary(&report);

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("report-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    if let Some(path) = &persist {
        eprintln!("Scores appended to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Submission", "Points", "Max", "Score"]);

    for r in &report.results {
        table.add_row(vec![
            Cell::new(&r.submission_id),
            Cell::new(format!("{}", r.score.raw_points)),
            Cell::new(format!("{}", r.score.max_points)),
            Cell::new(format!("{}%", r.score.percentage)),
        ]);
    }
    for f in &report.failures {
        table.add_row(vec![
            Cell::new(&f.submission_id),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("FAILED"),
        ]);
    }

    println!("{table}");

    let summary = &report.summary;
    println!(
        "Mean: {:.1}%  Highest: {}  Lowest: {}",
        summary.mean_percentage,
        summary
            .highest
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string()),
        summary
            .lowest
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string()),
    );
}

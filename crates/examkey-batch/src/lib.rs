//! examkey-batch — question banks, configuration, and batch scoring.
//!
//! Wraps the pure `examkey-core` functions with file loading, a bounded
//! parallel scoring engine, a persistence seam for computed scores, and
//! JSON batch reports that can be compared after a re-score.

pub mod bank;
pub mod config;
pub mod engine;
pub mod report;
pub mod traits;

pub use bank::{
    load_bank_directory, load_banks, parse_bank, parse_bank_str, validate_bank, BankIssue,
    QuestionBank,
};
pub use config::{load_config, load_config_from, ExamkeyConfig, IngestConfig};
pub use engine::{
    load_submissions, BatchConfig, BatchScorer, NoopReporter, ProgressReporter, Submission,
};
pub use report::{BatchReport, RescoreReport};
pub use traits::{JsonLinesStore, MemoryStore, NoopStore, ScoreStore};

//! examkey CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "examkey", version, about = "Exam answer keys, imports, and batch scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Source layout accepted by `examkey import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    /// JSON array of header -> cell objects, one per spreadsheet row
    Spreadsheet,
    /// Plain text, questions separated by blank lines
    Text,
    /// Text extracted from a word-processor document
    Word,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate question bank files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Import questions into a bank file
    Import {
        /// Input layout
        #[arg(long, value_enum)]
        format: ImportFormat,

        /// File to import
        #[arg(long)]
        input: PathBuf,

        /// Bank file to write (.toml)
        #[arg(long)]
        output: PathBuf,

        /// Bank id (default: input file stem)
        #[arg(long)]
        bank_id: Option<String>,

        /// Bank name (default: bank id)
        #[arg(long)]
        name: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a batch of submissions
    Score {
        /// Bank file
        #[arg(long)]
        bank: PathBuf,

        /// JSON array of submissions
        #[arg(long)]
        submissions: PathBuf,

        /// Output directory for the report (default: config output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also append every score to this JSON lines file
        #[arg(long)]
        persist: Option<PathBuf>,

        /// Max concurrent submissions (default: config parallelism)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Re-score submissions and compare against a baseline report
    Rescore {
        /// Bank file
        #[arg(long)]
        bank: PathBuf,

        /// JSON array of submissions
        #[arg(long)]
        submissions: PathBuf,

        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Exit code 1 if any score changed
        #[arg(long)]
        fail_on_change: bool,

        /// Max concurrent submissions (default: config parallelism)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Upgrade legacy question records
    Migrate {
        /// Legacy JSON export (array of records, or an object with `questions`)
        #[arg(long)]
        input: PathBuf,

        /// Bank file to write (.toml)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Bank id for the written bank (default: input file stem)
        #[arg(long)]
        bank_id: Option<String>,

        /// Bank name (default: bank id)
        #[arg(long)]
        name: Option<String>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examkey=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Import {
            format,
            input,
            output,
            bank_id,
            name,
            config,
        } => commands::import::execute(format, input, output, bank_id, name, config),
        Commands::Score {
            bank,
            submissions,
            output,
            persist,
            parallelism,
            config,
        } => {
            commands::score::execute(bank, submissions, output, persist, parallelism, config).await
        }
        Commands::Rescore {
            bank,
            submissions,
            baseline,
            format,
            fail_on_change,
            parallelism,
            config,
        } => {
            commands::rescore::execute(
                bank,
                submissions,
                baseline,
                format,
                fail_on_change,
                parallelism,
                config,
            )
            .await
        }
        Commands::Migrate {
            input,
            output,
            bank_id,
            name,
        } => commands::migrate::execute(input, output, bank_id, name),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

//! The `examkey import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examkey_batch::bank::QuestionBank;
use examkey_batch::config::load_config_from;
use examkey_core::ingest::{
    parse_spreadsheet_rows_with, parse_text_blocks_with, parse_word_blocks_with, IngestOutcome,
    RowError, SpreadsheetRow,
};

use crate::ImportFormat;

pub fn execute(
    format: ImportFormat,
    input: PathBuf,
    output: PathBuf,
    bank_id: Option<String>,
    name: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let opts = config.ingest.options();

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let outcome: IngestOutcome = match format {
        ImportFormat::Spreadsheet => {
            let rows: Vec<SpreadsheetRow> = serde_json::from_str(&content).with_context(|| {
                format!("failed to parse spreadsheet rows: {}", input.display())
            })?;
            parse_spreadsheet_rows_with(&rows, &opts)
        }
        ImportFormat::Text => parse_text_blocks_with(&content, &opts),
        ImportFormat::Word => parse_word_blocks_with(&content, &opts),
    };
    let (drafts, errors) = outcome.into_parts();

    println!("{} imported, {} failed", drafts.len(), errors.len());
    if !errors.is_empty() {
        print_errors(&errors);
    }

    anyhow::ensure!(
        !drafts.is_empty(),
        "no questions could be imported from {}",
        input.display()
    );

    let id = bank_id.unwrap_or_else(|| super::stem_of(&input));
    let name = name.unwrap_or_else(|| id.clone());
    let bank = QuestionBank::from_drafts(id, name, drafts);
    bank.save_toml(&output)?;
    println!("Bank written to: {}", output.display());

    Ok(())
}

fn print_errors(errors: &[RowError]) {
    let mut table = Table::new();
    table.set_header(vec!["Source", "Position", "Error"]);
    for e in errors {
        table.add_row(vec![
            Cell::new(e.origin),
            Cell::new(e.position),
            Cell::new(&e.kind),
        ]);
    }
    println!("{table}");
}

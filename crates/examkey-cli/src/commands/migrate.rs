//! The `examkey migrate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde_json::Value;

use examkey_batch::bank::QuestionBank;
use examkey_core::classify::classify_legacy_question;
use examkey_core::legacy::upgrade_legacy_question;

pub fn execute(
    input: PathBuf,
    output: Option<PathBuf>,
    bank_id: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse legacy JSON: {}", input.display()))?;

    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(records)) => records,
            _ => anyhow::bail!(
                "{}: expected an array of questions or an object with a `questions` array",
                input.display()
            ),
        },
        _ => anyhow::bail!("{}: expected an array of questions", input.display()),
    };

    let mut table = Table::new();
    table.set_header(vec!["#", "Id", "Inferred kind", "Result"]);

    let mut questions = Vec::new();
    let mut failed = 0usize;

    for (i, raw) in records.iter().enumerate() {
        let inferred = classify_legacy_question(raw);
        let shown_id = raw
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "-".to_string());

        match upgrade_legacy_question(raw) {
            Ok(question) => {
                let status = if question.kind == inferred {
                    "OK".to_string()
                } else {
                    format!("OK (as {})", question.kind)
                };
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&shown_id),
                    Cell::new(inferred),
                    Cell::new(status),
                ]);
                questions.push(question);
            }
            Err(e) => {
                tracing::warn!("legacy record {} not upgraded: {e}", i + 1);
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&shown_id),
                    Cell::new(inferred),
                    Cell::new(format!("FAILED: {e}")),
                ]);
                failed += 1;
            }
        }
    }

    println!("{table}");
    println!("{} upgraded, {} failed", questions.len(), failed);

    if let Some(output) = output {
        anyhow::ensure!(
            !questions.is_empty(),
            "no legacy records could be upgraded from {}",
            input.display()
        );
        let id = bank_id.unwrap_or_else(|| super::stem_of(&input));
        let bank = QuestionBank {
            name: name.unwrap_or_else(|| id.clone()),
            id,
            description: format!("Migrated from {}", input.display()),
            questions,
        };
        bank.save_toml(&output)?;
        println!("Bank written to: {}", output.display());
    }

    Ok(())
}

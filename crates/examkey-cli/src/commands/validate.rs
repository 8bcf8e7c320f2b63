//! The `examkey validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examkey_batch::bank::{load_banks, validate_bank};

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = load_banks(&bank_path)?;

    let mut total_issues = 0;

    for bank in &banks {
        println!(
            "Bank: {} ({} questions, {} points)",
            bank.name,
            bank.questions.len(),
            bank.max_points()
        );

        let issues = validate_bank(bank);
        for issue in &issues {
            let prefix = issue
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} ERROR: {}", issue.message);
        }
        total_issues += issues.len();
    }

    if total_issues == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_issues} issue(s) found.");
    }

    Ok(())
}

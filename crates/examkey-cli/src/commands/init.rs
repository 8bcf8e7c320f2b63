//! The `examkey init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examkey.toml").exists() {
        println!("examkey.toml already exists, skipping.");
    } else {
        std::fs::write("examkey.toml", SAMPLE_CONFIG)?;
        println!("Created examkey.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = std::path::Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit question-banks/example.toml or import your own questions");
    println!("  2. Run: examkey validate --bank question-banks/example.toml");
    println!(
        "  3. Run: examkey score --bank question-banks/example.toml --submissions submissions.json"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkey configuration

parallelism = 4
output_dir = "./examkey-results"

[ingest]
# Cells treated as "no option" when importing
placeholders = ["-"]
max_options = 5
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Question Bank"
description = "A small bank to get started"

[[questions]]
id = "q1"
kind = "SingleChoice"
prompt = "Ibukota Indonesia adalah ..."
options = ["Bandung", "Jakarta", "Surabaya"]
answerKey = { type = "SingleChoice", index = 1 }

[[questions]]
id = "q2"
kind = "MultiChoice"
prompt = "Manakah yang termasuk bilangan prima?"
weight = 2.0
options = ["2", "4", "5", "9"]
answerKey = { type = "MultiChoice", indices = [0, 2] }

[[questions]]
id = "q3"
kind = "TrueFalseSet"
prompt = "Tentukan benar atau salah."
options = ["Matahari terbit di timur", "Bulan adalah bintang"]
answerKey = { type = "TrueFalseSet", perStatement = { 0 = true, 1 = false } }

[[questions]]
id = "q4"
kind = "Essay"
prompt = "Siapa proklamator kemerdekaan Indonesia?"
answerKey = { type = "Essay", expectedText = "Soekarno" }
"#;

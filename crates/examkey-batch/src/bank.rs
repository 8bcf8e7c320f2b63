//! Question bank files.
//!
//! A bank holds the canonical questions of one test, stored as TOML (or
//! JSON with the same shape):
//!
//! ```toml
//! [bank]
//! id = "ipa-7"
//! name = "IPA Kelas 7"
//!
//! [[questions]]
//! id = "q1"
//! kind = "SingleChoice"
//! prompt = "Ibukota Jepang adalah ..."
//! options = ["Osaka", "Tokyo"]
//! answerKey = { type = "SingleChoice", index = 1 }
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkey_core::model::{Question, QuestionDraft};

/// The questions of one test.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// On-disk layout of a bank file.
#[derive(Debug, Serialize, Deserialize)]
struct BankFile {
    bank: BankHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BankHeader {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
}

impl QuestionBank {
    /// Build a bank from normalized drafts, assigning ids `q1..qN` in order.
    pub fn from_drafts(
        id: impl Into<String>,
        name: impl Into<String>,
        drafts: Vec<QuestionDraft>,
    ) -> Self {
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| draft.into_question(format!("q{}", i + 1)))
            .collect();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            questions,
        }
    }

    /// Sum of all question weights.
    pub fn max_points(&self) -> f64 {
        self.questions.iter().map(|q| q.weight).sum()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.to_file()).context("failed to serialize question bank")
    }

    /// Write the bank as TOML, creating parent directories as needed.
    pub fn save_toml(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write question bank to {}", path.display()))
    }

    fn to_file(&self) -> BankFile {
        BankFile {
            bank: BankHeader {
                id: self.id.clone(),
                name: self.name.clone(),
                description: self.description.clone(),
            },
            questions: self.questions.clone(),
        }
    }
}

impl From<BankFile> for QuestionBank {
    fn from(file: BankFile) -> Self {
        Self {
            id: file.bank.id,
            name: file.bank.name,
            description: file.bank.description,
            questions: file.questions,
        }
    }
}

/// Parse a bank file. `.json` files are read as JSON, anything else as TOML.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse bank content; `source_path` picks the format and names the file in
/// errors.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let file: BankFile = if is_json(source_path) {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?
    };
    Ok(file.into())
}

/// Recursively load every `.toml` and `.json` bank under a directory.
/// Files that fail to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(banks)
}

/// Load a single bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_bank(path)?])
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// A problem found by [`validate_bank`].
#[derive(Debug, Clone, PartialEq)]
pub struct BankIssue {
    /// The question concerned, if the issue is not bank-wide.
    pub question_id: Option<String>,
    pub message: String,
}

/// Check a bank for authoring problems.
pub fn validate_bank(bank: &QuestionBank) -> Vec<BankIssue> {
    let mut issues = Vec::new();

    if bank.questions.is_empty() {
        issues.push(BankIssue {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for question in &bank.questions {
        if !seen_ids.insert(&question.id) {
            issues.push(BankIssue {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &bank.questions {
        if question.prompt.trim().is_empty() {
            issues.push(BankIssue {
                question_id: Some(question.id.clone()),
                message: "prompt is empty".into(),
            });
        }
        if let Err(e) = question.validate() {
            issues.push(BankIssue {
                question_id: Some(question.id.clone()),
                message: e.to_string(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkey_core::model::{AnswerKey, QuestionKind};
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[bank]
id = "ips-7"
name = "IPS Kelas 7"

[[questions]]
id = "q1"
kind = "SingleChoice"
prompt = "Ibukota Jepang adalah ..."
options = ["Osaka", "Tokyo", "Kyoto"]
answerKey = { type = "SingleChoice", index = 1 }

[[questions]]
id = "q2"
kind = "Matching"
prompt = "Pasangkan negara dengan ibukotanya."
weight = 2.0
options = ["Jepang", "Indonesia"]
matchingRightOptions = ["Jakarta", "Tokyo"]
answerKey = { type = "Matching", pairs = { 1 = 2, 2 = 1 } }

[[questions]]
id = "q3"
kind = "TrueFalseSet"
prompt = "Benar atau salah?"
options = ["Air membeku pada 0C", "Bulan adalah planet"]

[questions.answerKey]
type = "TrueFalseSet"
perStatement = { 0 = true, 1 = false }
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(bank.id, "ips-7");
        assert_eq!(bank.questions.len(), 3);
        assert_eq!(bank.questions[0].weight, 1.0);
        assert_eq!(bank.questions[1].kind, QuestionKind::Matching);
        assert_eq!(
            bank.questions[1].answer_key,
            AnswerKey::Matching {
                pairs: [(1, 2), (2, 1)].into_iter().collect()
            }
        );
        assert_eq!(bank.max_points(), 4.0);
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn toml_roundtrip() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        let text = bank.to_toml_string().unwrap();
        let back = parse_bank_str(&text, &PathBuf::from("again.toml")).unwrap();
        assert_eq!(back, bank);
    }

    #[test]
    fn parse_json_bank() {
        let json = r#"{
            "bank": { "id": "j", "name": "JSON bank" },
            "questions": [{
                "id": "e1", "kind": "Essay", "prompt": "Proklamator?",
                "answerKey": { "type": "Essay", "expectedText": "Soekarno" }
            }]
        }"#;
        let bank = parse_bank_str(json, &PathBuf::from("bank.json")).unwrap();
        assert_eq!(bank.questions[0].kind, QuestionKind::Essay);
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_bank_str("this is not [valid toml }{", &PathBuf::from("bad.toml"));
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"));
    }

    #[test]
    fn validate_reports_issues() {
        let toml = r#"
[bank]
id = "broken"
name = "Broken"

[[questions]]
id = "same"
kind = "SingleChoice"
prompt = " "
options = ["a", "b"]
answerKey = { type = "SingleChoice", index = 0 }

[[questions]]
id = "same"
kind = "SingleChoice"
prompt = "Out of range"
options = ["a", "b"]
answerKey = { type = "SingleChoice", index = 5 }
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("broken.toml")).unwrap();
        let issues = validate_bank(&bank);
        assert!(issues.iter().any(|i| i.message.contains("duplicate")));
        assert!(issues.iter().any(|i| i.message == "prompt is empty"));
        assert!(issues.iter().any(|i| i.message.contains("out of range")));
    }

    #[test]
    fn from_drafts_assigns_sequential_ids() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        let drafts: Vec<QuestionDraft> = bank
            .questions
            .iter()
            .map(|q| QuestionDraft {
                kind: q.kind,
                prompt: q.prompt.clone(),
                weight: q.weight,
                options: q.options.clone(),
                matching_right_options: q.matching_right_options.clone(),
                answer_key: q.answer_key.clone(),
            })
            .collect();
        let rebuilt = QuestionBank::from_drafts("new", "New", drafts);
        let ids: Vec<_> = rebuilt.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("bad.toml"), "not a bank").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("copy.toml"), VALID_TOML).unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 2);
        assert!(banks.iter().all(|b| b.id == "ips-7"));
    }

    #[test]
    fn save_and_reload() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("bank.toml");
        bank.save_toml(&path).unwrap();
        assert_eq!(parse_bank(&path).unwrap(), bank);
    }
}

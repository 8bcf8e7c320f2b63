//! Spreadsheet row import.
//!
//! The import collaborator decodes the workbook and hands over one
//! header -> cell map per data row. Headers are matched case-insensitively
//! with English and Indonesian aliases. For matching questions the lettered
//! option columns hold the right-hand items and `left_N` columns the
//! left-hand items.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{build_draft, IngestOptions, IngestOutcome, RawRecord, RowOrigin};

const TYPE_HEADERS: &[&str] = &["type", "tipe", "jenis", "question_type", "tipe_soal"];
const PROMPT_HEADERS: &[&str] = &["question", "soal", "pertanyaan", "prompt"];
const ANSWER_HEADERS: &[&str] = &["answer", "answer_key", "kunci", "kunci_jawaban", "jawaban"];
const WEIGHT_HEADERS: &[&str] = &["weight", "bobot", "points", "poin"];
const OPTION_PREFIXES: &[&str] = &["option_", "opsi_", "pilihan_"];
const LEFT_PREFIXES: &[&str] = &["left_", "kiri_", "premis_"];

/// One data row, keyed by normalized header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SpreadsheetRow {
    cells: BTreeMap<String, String>,
}

impl SpreadsheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and callers assembling rows by
    /// hand.
    pub fn with(mut self, header: &str, value: &str) -> Self {
        self.insert(header, value);
        self
    }

    pub fn insert(&mut self, header: &str, value: &str) {
        self.cells.insert(normalize_header(header), value.to_string());
    }

    /// The first non-blank cell under any of `headers`.
    pub fn get(&self, headers: &[&str]) -> Option<&str> {
        headers
            .iter()
            .filter_map(|h| self.cells.get(*h))
            .map(String::as_str)
            .find(|v| !v.trim().is_empty())
    }

    fn lettered(&self, index: usize) -> Option<&str> {
        let letter = ((b'a' + index as u8) as char).to_string();
        let mut headers: Vec<String> = OPTION_PREFIXES
            .iter()
            .map(|p| format!("{p}{letter}"))
            .collect();
        headers.push(letter);
        let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        self.get(&refs)
    }

    fn numbered(&self, ordinal: usize) -> Option<&str> {
        let headers: Vec<String> = LEFT_PREFIXES
            .iter()
            .map(|p| format!("{p}{ordinal}"))
            .collect();
        let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        self.get(&refs)
    }

    fn to_record(&self, opts: &IngestOptions) -> RawRecord {
        let mut record = RawRecord {
            type_token: self.get(TYPE_HEADERS).map(str::to_string),
            prompt: self.get(PROMPT_HEADERS).unwrap_or_default().to_string(),
            answer: self.get(ANSWER_HEADERS).map(str::to_string),
            weight: self.get(WEIGHT_HEADERS).map(str::to_string),
            ..RawRecord::default()
        };
        for index in 0..opts.option_limit() {
            if let Some(text) = self.lettered(index) {
                record.set_option(index, text);
            }
            if let Some(text) = self.numbered(index + 1) {
                record.set_item(index, text);
            }
        }
        record
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for SpreadsheetRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = SpreadsheetRow::new();
        for (k, v) in iter {
            row.insert(k.as_ref(), v.as_ref());
        }
        row
    }
}

impl<'de> Deserialize<'de> for SpreadsheetRow {
    /// Reads a JSON object; numbers and booleans become their text form and
    /// nulls are skipped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(map) = Value::deserialize(deserializer)? else {
            return Err(D::Error::custom("spreadsheet row must be an object"));
        };
        let mut row = SpreadsheetRow::new();
        for (header, cell) in &map {
            match cell {
                Value::String(s) => row.insert(header, s),
                Value::Number(n) => row.insert(header, &n.to_string()),
                Value::Bool(b) => row.insert(header, &b.to_string()),
                _ => {}
            }
        }
        Ok(row)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' || c == '.' { '_' } else { c })
        .collect()
}

/// Normalize spreadsheet rows with default options.
pub fn parse_spreadsheet_rows(rows: &[SpreadsheetRow]) -> IngestOutcome {
    parse_spreadsheet_rows_with(rows, &IngestOptions::default())
}

/// Normalize spreadsheet rows. Row positions in diagnostics are 1-based data
/// rows (the header row is not counted).
pub fn parse_spreadsheet_rows_with(rows: &[SpreadsheetRow], opts: &IngestOptions) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    for (i, row) in rows.iter().enumerate() {
        outcome.push(
            RowOrigin::SpreadsheetRow,
            i + 1,
            build_draft(row.to_record(opts), opts),
        );
    }
    outcome
}

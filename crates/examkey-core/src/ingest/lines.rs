//! Line classification for the text and word-document formats.

use once_cell::sync::Lazy;
use regex::Regex;

use super::RawRecord;

static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(type|tipe|jenis|answer|kunci(?:\s+jawaban)?|jawaban|weight|bobot|q|soal|question|pertanyaan)\s*[:=]\s*(.*)$",
    )
    .expect("field line pattern is valid")
});

static LETTERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z])[.)]\s+(.*)$").expect("lettered line pattern is valid"));

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[.)]\s+(.*)$").expect("numbered line pattern is valid"));

/// A labelled field recognized in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type,
    Answer,
    Weight,
    Prompt,
}

/// One classified line of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Field(Field, &'a str),
    /// Zero-based letter index and text.
    Lettered(usize, &'a str),
    /// Zero-based ordinal index and text.
    Numbered(usize, &'a str),
    Text(&'a str),
}

/// Letter case accepted for option labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCase {
    Upper,
    Any,
}

/// Classify a trimmed line. Labels past `limit` are treated as prose.
pub fn classify(line: &str, limit: usize, case: LabelCase) -> Line<'_> {
    if let Some(caps) = FIELD_LINE.captures(line) {
        let field = match caps[1].to_lowercase().as_str() {
            "type" | "tipe" | "jenis" => Field::Type,
            "weight" | "bobot" => Field::Weight,
            "q" | "soal" | "question" | "pertanyaan" => Field::Prompt,
            _ => Field::Answer,
        };
        let value = caps.get(2).map_or("", |m| m.as_str().trim());
        return Line::Field(field, value);
    }

    if let Some(caps) = LETTERED_LINE.captures(line) {
        let label = caps[1].chars().next().unwrap_or('?');
        if case == LabelCase::Any || label.is_ascii_uppercase() {
            let index = (label.to_ascii_uppercase() as u8 - b'A') as usize;
            if index < limit {
                return Line::Lettered(index, caps.get(2).map_or("", |m| m.as_str().trim()));
            }
        }
    }

    if let Some(caps) = NUMBERED_LINE.captures(line) {
        if let Ok(ordinal) = caps[1].parse::<usize>() {
            if (1..=limit).contains(&ordinal) {
                return Line::Numbered(ordinal - 1, caps.get(2).map_or("", |m| m.as_str().trim()));
            }
        }
    }

    Line::Text(line)
}

/// Fold a classified line into the record being assembled.
pub fn apply(record: &mut RawRecord, line: Line<'_>) {
    match line {
        Line::Field(Field::Type, value) => record.type_token = Some(value.to_string()),
        Line::Field(Field::Answer, value) => record.answer = Some(value.to_string()),
        Line::Field(Field::Weight, value) => record.weight = Some(value.to_string()),
        Line::Field(Field::Prompt, value) => record.push_prompt_line(value),
        Line::Lettered(index, text) => record.set_option(index, text),
        Line::Numbered(index, text) => record.set_item(index, text),
        Line::Text(text) => record.push_prompt_line(text),
    }
}

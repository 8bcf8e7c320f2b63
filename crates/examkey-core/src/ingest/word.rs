//! Word-processor document import.
//!
//! Works on the plain text the import collaborator extracted from the
//! document. Each question starts at a heading such as
//! `Soal 3 [MULTIPLE] (bobot 2)`; paragraph breaks inside a question are
//! ignored. Option labels may be lower case (`a)`), and non-breaking spaces
//! and bullet glyphs left over from extraction are cleaned up.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lines::{self, LabelCase};
use super::{build_draft, IngestOptions, IngestOutcome, RawRecord, RowOrigin};

/// `Soal 3`, alone or followed by a delimiter (`Soal 3. ...`) or a tag
/// (`Soal 3 [ESSAY] ...`). Prose such as `No. 3 adalah ...` is not a heading.
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:soal|question|nomor|no\.?)\s*(\d+)(?:\s*[.:)]\s*(.*)|\s*([\[(].*))?$")
        .expect("heading pattern is valid")
});

static TYPE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("type tag pattern is valid"));

static WEIGHT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((?:bobot|weight|poin|points)\s*[:=]?\s*([0-9]+(?:[.,][0-9]+)?)\)")
        .expect("weight tag pattern is valid")
});

const BULLETS: &[char] = &['\u{2022}', '\u{25CF}', '\u{25E6}', '\u{25AA}', '\u{2023}', '\u{00B7}'];

/// Normalize word-document blocks with default options.
pub fn parse_word_blocks(text: &str) -> IngestOutcome {
    parse_word_blocks_with(text, &IngestOptions::default())
}

pub fn parse_word_blocks_with(text: &str, opts: &IngestOptions) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    let mut current: Option<RawRecord> = None;
    let mut position = 0;

    for raw_line in text.lines() {
        let line = clean_line(raw_line);
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = HEADING.captures(&line) {
            if let Some(record) = current.take() {
                outcome.push(RowOrigin::WordBlock, position, build_draft(record, opts));
            }
            position += 1;
            let rest = caps.get(2).or_else(|| caps.get(3));
            current = Some(heading_record(rest.map_or("", |m| m.as_str())));
            continue;
        }

        match current.as_mut() {
            Some(record) => lines::apply(
                record,
                lines::classify(&line, opts.option_limit(), LabelCase::Any),
            ),
            None => tracing::debug!(line = %line, "ignoring text before the first question heading"),
        }
    }

    if let Some(record) = current {
        outcome.push(RowOrigin::WordBlock, position, build_draft(record, opts));
    }
    outcome
}

/// Start a record from the text following `Soal N`, pulling out the
/// `[TYPE]` and `(bobot W)` tags.
fn heading_record(rest: &str) -> RawRecord {
    let mut record = RawRecord::default();
    let mut rest = rest.to_string();

    if let Some(caps) = TYPE_TAG.captures(&rest) {
        record.type_token = Some(caps[1].trim().to_string());
        rest = TYPE_TAG.replace(&rest, "").into_owned();
    }
    if let Some(caps) = WEIGHT_TAG.captures(&rest) {
        record.weight = Some(caps[1].to_string());
        rest = WEIGHT_TAG.replace(&rest, "").into_owned();
    }

    let rest = rest.trim();
    if !rest.is_empty() {
        record.push_prompt_line(rest);
    }
    record
}

fn clean_line(line: &str) -> String {
    let replaced: String = line
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\t' | '\u{2007}' | '\u{202F}' => ' ',
            c => c,
        })
        .collect();
    replaced
        .trim()
        .trim_start_matches(BULLETS)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RowErrorKind;
    use crate::model::{AnswerKey, QuestionKind};

    const DOCUMENT: &str = "\
Ujian Tengah Semester\u{00A0}IPS
Kelas 7

Soal 1 [SINGLE]
Siapa proklamator kemerdekaan Indonesia?

a) Soekarno
b) Tan Malaka
c) -
Kunci: A

Soal 2 [MULTIPLE] (bobot 2)
Pilih pulau yang termasuk Sunda Besar.
\u{2022} A. Jawa
\u{2022} B. Bali
\u{2022} C. Sumatra
Kunci Jawaban: A, C

Question 3
Tipe: TRUE_FALSE
Tentukan benar atau salah:
1. Indonesia merdeka tahun 1945
2. Ibukota Indonesia adalah Bandung
Jawaban: 1-BENAR; 2-SALAH

Soal 4 [ESSAY] Sebutkan nama mata uang Indonesia.
Kunci: Rupiah
";

    #[test]
    fn parses_document_blocks() {
        let outcome = parse_word_blocks(DOCUMENT);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.drafts.len(), 4);

        let first = &outcome.drafts[0];
        assert_eq!(first.kind, QuestionKind::SingleChoice);
        assert_eq!(first.options, vec!["Soekarno", "Tan Malaka"]);
        assert_eq!(first.answer_key, AnswerKey::SingleChoice { index: 0 });

        let second = &outcome.drafts[1];
        assert_eq!(second.weight, 2.0);
        assert_eq!(second.prompt, "Pilih pulau yang termasuk Sunda Besar.");
        assert_eq!(
            second.answer_key,
            AnswerKey::MultiChoice {
                indices: [0, 2].into_iter().collect()
            }
        );

        let third = &outcome.drafts[2];
        assert_eq!(third.kind, QuestionKind::TrueFalseSet);
        assert_eq!(third.options.len(), 2);

        let fourth = &outcome.drafts[3];
        assert_eq!(fourth.prompt, "Sebutkan nama mata uang Indonesia.");
        assert_eq!(
            fourth.answer_key,
            AnswerKey::Essay {
                expected_text: "Rupiah".into()
            }
        );
    }

    #[test]
    fn matching_block() {
        let text = "No. 1 [MATCHING]\nPasangkan.\n1) Jepang\n2) Peru\na) Lima\nb) Tokyo\nKunci: 1-B;2-A";
        let outcome = parse_word_blocks(text);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(
            outcome.drafts[0].answer_key,
            AnswerKey::Matching {
                pairs: [(1, 2), (2, 1)].into_iter().collect()
            }
        );
    }

    #[test]
    fn block_errors_keep_positions() {
        let text = "Soal 1\nTanpa tipe\na) x\nb) y\nKunci: A\n\
                    Soal 2 [SINGLE]\nValid\na) x\nb) y\nKunci: B\n\
                    Soal 3 [SINGLE] (bobot 0)\nBobot nol\na) x\nb) y\nKunci: A";
        let outcome = parse_word_blocks(text);
        assert_eq!(outcome.drafts.len(), 1);
        assert_eq!(outcome.drafts[0].prompt, "Valid");
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[0].position, 1);
        assert_eq!(outcome.errors[0].kind, RowErrorKind::MissingType);
        assert_eq!(outcome.errors[1].position, 3);
        assert_eq!(outcome.errors[1].kind, RowErrorKind::InvalidWeight("0".into()));
    }

    #[test]
    fn prose_mentioning_numbers_stays_in_the_block() {
        let text = "Soal 1 [SINGLE]\n\
                    Question 2 dari ujian lalu diulang di sini.\n\
                    No. 3 pada daftar adalah jawaban yang benar?\n\
                    a) Ya\nb) Tidak\nKunci: A\n\
                    Soal 2: [ESSAY] Ibukota Jepang?\nKunci: Tokyo";
        let outcome = parse_word_blocks(text);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.drafts.len(), 2);
        assert_eq!(
            outcome.drafts[0].prompt,
            "Question 2 dari ujian lalu diulang di sini.\nNo. 3 pada daftar adalah jawaban yang benar?"
        );
        assert_eq!(outcome.drafts[0].options, vec!["Ya", "Tidak"]);
        assert_eq!(outcome.drafts[1].kind, QuestionKind::Essay);
        assert_eq!(outcome.drafts[1].prompt, "Ibukota Jepang?");
    }

    #[test]
    fn text_without_headings_yields_nothing() {
        let outcome = parse_word_blocks("Judul\nTidak ada soal");
        assert!(outcome.drafts.is_empty());
        assert!(outcome.errors.is_empty());
    }
}

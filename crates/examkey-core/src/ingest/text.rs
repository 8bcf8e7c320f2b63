//! Plain-text block import.
//!
//! Blocks are separated by blank lines:
//!
//! ```text
//! TYPE: SINGLE
//! Ibukota Jepang adalah ...
//! A. Osaka
//! B. Tokyo
//! ANSWER: B
//! ```
//!
//! Lettered lines (`A.` / `A)`) are options, numbered lines (`1.` / `1)`)
//! are matching left items or true/false statements, and any other line is
//! question text.

use super::lines::{self, LabelCase};
use super::{build_draft, IngestOptions, IngestOutcome, RawRecord, RowOrigin};

/// Normalize text blocks with default options.
pub fn parse_text_blocks(text: &str) -> IngestOutcome {
    parse_text_blocks_with(text, &IngestOptions::default())
}

pub fn parse_text_blocks_with(text: &str, opts: &IngestOptions) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    for (i, block) in split_blocks(text).into_iter().enumerate() {
        let mut record = RawRecord::default();
        for line in block {
            lines::apply(
                &mut record,
                lines::classify(line, opts.option_limit(), LabelCase::Upper),
            );
        }
        outcome.push(RowOrigin::TextBlock, i + 1, build_draft(record, opts));
    }
    outcome
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RowErrorKind;
    use crate::model::{AnswerKey, QuestionKind};

    const SAMPLE: &str = "\
TYPE: SINGLE
Ibukota Jepang adalah ...
A. Osaka
B. Tokyo
C. Kyoto
ANSWER: B

TYPE: MULTIPLE
WEIGHT: 2
Bilangan prima:
A. 2
B. 4
C. 5
ANSWER: A;C

TIPE: MATCHING
Pasangkan negara dengan ibukotanya.
1. Jepang
2. Indonesia
A. Jakarta
B. Tokyo
KUNCI: 1-B, 2-A

TYPE: TRUE_FALSE
Tentukan benar atau salah.
1. Air membeku pada 0C
2. Bulan adalah planet
ANSWER: 1-B;2-S

TYPE: ESSAY
Q: Siapa proklamator kemerdekaan?
JAWABAN: Soekarno
";

    #[test]
    fn parses_every_kind() {
        let outcome = parse_text_blocks(SAMPLE);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        let kinds: Vec<_> = outcome.drafts.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                QuestionKind::SingleChoice,
                QuestionKind::MultiChoice,
                QuestionKind::Matching,
                QuestionKind::TrueFalseSet,
                QuestionKind::Essay,
            ]
        );

        let multi = &outcome.drafts[1];
        assert_eq!(multi.weight, 2.0);
        assert_eq!(multi.prompt, "Bilangan prima:");
        assert_eq!(
            multi.answer_key,
            AnswerKey::MultiChoice {
                indices: [0, 2].into_iter().collect()
            }
        );

        let matching = &outcome.drafts[2];
        assert_eq!(matching.options, vec!["Jepang", "Indonesia"]);
        assert_eq!(matching.matching_right_options, vec!["Jakarta", "Tokyo"]);
        assert_eq!(
            matching.answer_key,
            AnswerKey::Matching {
                pairs: [(1, 2), (2, 1)].into_iter().collect()
            }
        );

        let tf = &outcome.drafts[3];
        assert_eq!(tf.options.len(), 2);
        assert_eq!(
            tf.answer_key,
            AnswerKey::TrueFalseSet {
                per_statement: [(0, true), (1, false)].into_iter().collect()
            }
        );

        assert_eq!(
            outcome.drafts[4].answer_key,
            AnswerKey::Essay {
                expected_text: "Soekarno".into()
            }
        );
    }

    #[test]
    fn multi_line_prompt_is_kept() {
        let text = "TYPE: SINGLE\nBaca teks berikut.\nLalu jawab.\nA. ya\nB. tidak\nANSWER: A";
        let outcome = parse_text_blocks(text);
        assert_eq!(outcome.drafts[0].prompt, "Baca teks berikut.\nLalu jawab.");
    }

    #[test]
    fn failing_block_is_reported_and_skipped() {
        let text = "TYPE: SINGLE\nSoal satu\nA. x\nB. y\nANSWER: E\n\n\n\
                    TYPE: SINGLE\nSoal dua\nA. x\nB. y\nANSWER: A\n\n\
                    Judul tanpa tipe";
        let outcome = parse_text_blocks(text);
        assert_eq!(outcome.drafts.len(), 1);
        assert_eq!(outcome.drafts[0].prompt, "Soal dua");
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[0].position, 1);
        assert!(matches!(
            outcome.errors[0].kind,
            RowErrorKind::AnswerOutOfRange(_)
        ));
        assert_eq!(outcome.errors[1].position, 3);
        assert_eq!(outcome.errors[1].kind, RowErrorKind::MissingType);
    }

    #[test]
    fn lowercase_labels_are_prose() {
        let text = "TYPE: SINGLE\nPilih:\na. satu\nb. dua\nANSWER: A";
        let outcome = parse_text_blocks(text);
        assert!(matches!(
            outcome.errors[0].kind,
            RowErrorKind::TooFewOptions { found: 0, .. }
        ));
    }
}

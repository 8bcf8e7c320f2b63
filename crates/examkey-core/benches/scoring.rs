use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examkey_core::model::{Answer, AnswerKey, AnswerValue, Question, QuestionKind};
use examkey_core::scoring::{question_points, score_submission};

fn options(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("option {i}")).collect()
}

fn make_test(questions_per_kind: usize) -> (Vec<Question>, HashMap<String, Answer>) {
    let mut questions = Vec::new();
    let mut answers = HashMap::new();

    for i in 0..questions_per_kind {
        let id = format!("s{i}");
        questions.push(Question {
            id: id.clone(),
            kind: QuestionKind::SingleChoice,
            prompt: "single".into(),
            weight: 1.0,
            options: options(5),
            matching_right_options: vec![],
            answer_key: AnswerKey::SingleChoice { index: i % 5 },
        });
        answers.insert(id, Answer::new(AnswerValue::Choice(i % 3)));

        let id = format!("m{i}");
        questions.push(Question {
            id: id.clone(),
            kind: QuestionKind::Matching,
            prompt: "matching".into(),
            weight: 2.0,
            options: options(4),
            matching_right_options: options(4),
            answer_key: AnswerKey::Matching {
                pairs: (1..=4).map(|l| (l, 5 - l)).collect(),
            },
        });
        answers.insert(
            id,
            Answer::new(AnswerValue::Pairs((1..=4).map(|l| (l, l)).collect())),
        );

        let id = format!("t{i}");
        questions.push(Question {
            id: id.clone(),
            kind: QuestionKind::TrueFalseSet,
            prompt: "true/false".into(),
            weight: 1.5,
            options: options(5),
            matching_right_options: vec![],
            answer_key: AnswerKey::TrueFalseSet {
                per_statement: (0..5).map(|s| (s, s % 2 == 0)).collect(),
            },
        });
        answers.insert(
            id,
            Answer::new(AnswerValue::Statements((0..5).map(|s| (s, true)).collect())),
        );

        let id = format!("e{i}");
        questions.push(Question {
            id: id.clone(),
            kind: QuestionKind::Essay,
            prompt: "essay".into(),
            weight: 1.0,
            options: vec![],
            matching_right_options: vec![],
            answer_key: AnswerKey::Essay {
                expected_text: "Fotosintesis".into(),
            },
        });
        answers.insert(id, Answer::new(AnswerValue::Text(" fotosintesis ".into())));
    }

    (questions, answers)
}

fn bench_score_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_submission");

    for size in [10, 50, 250] {
        let (questions, answers) = make_test(size);
        group.bench_function(format!("questions={}", questions.len()), |b| {
            b.iter(|| score_submission(black_box(&questions), black_box(&answers)))
        });
    }

    group.finish();
}

fn bench_question_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("question_points");
    let (questions, answers) = make_test(1);

    for question in &questions {
        let answer = answers.get(&question.id);
        group.bench_function(question.kind.to_string(), |b| {
            b.iter(|| question_points(black_box(question), black_box(answer)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score_submission, bench_question_points);
criterion_main!(benches);

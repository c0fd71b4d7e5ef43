use criterion::{criterion_group, criterion_main, Criterion};
use jungsi_score::formula::{Component, HistoryPolicy, ProgramFormulaSpec, SelectionGroup, SpecRegistry};
use jungsi_score::lookup::ScoreLookupTable;
use jungsi_score::subject::{Category, ElectivePool, StudentInputSet, SubjectResult};
use jungsi_score::ConversionEngine;
use std::hint::black_box;

const PROGRAMS: usize = 200;

fn setup_engine() -> (ConversionEngine, Vec<String>) {
    let codes: Vec<String> = (0..PROGRAMS).map(|i| format!("U{:03}", i)).collect();

    let mut b = ScoreLookupTable::builder();
    for (i, code) in codes.iter().enumerate() {
        let scale = 1.0 + i as f64 / PROGRAMS as f64;
        for standard in 100..=150u32 {
            let s = standard.to_string();
            b.number("Korean", &s, code, f64::from(standard) * 0.5 * scale)
                .number("Math-Calculus", &s, code, f64::from(standard) * 0.6 * scale);
        }
        for standard in 40..=80u32 {
            let s = standard.to_string();
            b.number("Physics-I", &s, code, f64::from(standard) * 0.5 * scale)
                .number("Chemistry-I", &s, code, f64::from(standard) * 0.5 * scale);
        }
        for grade in 1..=9u8 {
            let g = grade.to_string();
            b.number("English", &g, code, 100.0 - f64::from(grade) * 5.0)
                .number("Korean-History", &g, code, 10.0 - f64::from(grade) * 0.5);
        }
    }

    let specs: SpecRegistry = codes
        .iter()
        .map(|code| {
            ProgramFormulaSpec::builder()
                .program(code.as_str())
                .required(vec![Component::Korean, Component::Math, Component::English])
                .selections(vec![SelectionGroup::new(
                    vec![Component::EachElective {
                        pool: ElectivePool::Science,
                    }],
                    vec![1.0, 0.8],
                )])
                .history(HistoryPolicy::AddedUnconditionally)
                .build()
        })
        .collect();

    let engine = ConversionEngine::builder()
        .table(b.build())
        .specs(specs)
        .build();
    (engine, codes)
}

fn student(korean: u32) -> StudentInputSet {
    StudentInputSet::builder()
        .subject(SubjectResult::new("Korean", Category::Language).with_standard(korean))
        .subject(SubjectResult::new("Math-Calculus", Category::Math).with_standard(130))
        .subject(SubjectResult::new("English", Category::ForeignLanguage).with_grade(2))
        .subject(SubjectResult::new("Korean-History", Category::CivicHistory).with_grade(1))
        .subject(SubjectResult::new("Physics-I", Category::Science).with_standard(69))
        .subject(SubjectResult::new("Chemistry-I", Category::Science).with_standard(66))
        .build()
        .expect("bench student is valid")
}

fn bench_conversion(c: &mut Criterion) {
    let (engine, codes) = setup_engine();
    let input = student(140);

    c.bench_function("single_program", |b| {
        b.iter(|| engine.calculate_conversion_score(black_box("U100"), black_box(&input)))
    });

    c.bench_function("all_programs", |b| {
        b.iter(|| engine.calculate_many(black_box(&codes[..]), black_box(&input)))
    });

    let cohort: Vec<(String, StudentInputSet)> = (100..=150)
        .map(|k| (format!("S{}", k), student(k)))
        .collect();
    c.bench_function("rank_cohort", |b| {
        b.iter(|| engine.rank_students(black_box("U050"), black_box(&cohort[..])))
    });
}

criterion_group!(benches, bench_conversion);
criterion_main!(benches);

#![allow(dead_code)]

use jungsi_score::formula::{Component, HistoryPolicy, ProgramFormulaSpec, SelectionGroup};
use jungsi_score::lookup::{LookupTableBuilder, ScoreLookupTable, TableValue};
use jungsi_score::subject::{Category, ElectivePool, StudentInputSet, SubjectResult};

/// Builder for one student's input set, defaulting to the reference student:
/// Korean 145, Calculus 130, English 1, History 1, Physics I 69, Chemistry I 68.
pub struct StudentBuilder {
    korean: Option<SubjectResult>,
    math: Option<SubjectResult>,
    english: Option<SubjectResult>,
    history: Option<SubjectResult>,
    electives: Vec<SubjectResult>,
    second_language: Option<SubjectResult>,
}

impl StudentBuilder {
    pub fn reference() -> Self {
        Self {
            korean: Some(
                SubjectResult::new("Korean", Category::Language)
                    .with_standard(145)
                    .with_percentile(98.0),
            ),
            math: Some(
                SubjectResult::new("Math-Calculus", Category::Math)
                    .with_standard(130)
                    .with_percentile(95.0),
            ),
            english: Some(SubjectResult::new("English", Category::ForeignLanguage).with_grade(1)),
            history: Some(
                SubjectResult::new("Korean-History", Category::CivicHistory).with_grade(1),
            ),
            electives: vec![
                SubjectResult::new("Physics-I", Category::Science)
                    .with_standard(69)
                    .with_percentile(96.0),
                SubjectResult::new("Chemistry-I", Category::Science)
                    .with_standard(68)
                    .with_percentile(93.0),
            ],
            second_language: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            korean: None,
            math: None,
            english: None,
            history: None,
            electives: Vec::new(),
            second_language: None,
        }
    }

    pub fn korean(mut self, standard: u32) -> Self {
        self.korean = Some(SubjectResult::new("Korean", Category::Language).with_standard(standard));
        self
    }

    pub fn math(mut self, key: &str, standard: u32) -> Self {
        self.math = Some(SubjectResult::new(key, Category::Math).with_standard(standard));
        self
    }

    pub fn without_math(mut self) -> Self {
        self.math = None;
        self
    }

    pub fn history_grade(mut self, grade: u8) -> Self {
        self.history =
            Some(SubjectResult::new("Korean-History", Category::CivicHistory).with_grade(grade));
        self
    }

    pub fn electives(mut self, electives: Vec<SubjectResult>) -> Self {
        self.electives = electives;
        self
    }

    pub fn second_language(mut self, key: &str, standard: u32) -> Self {
        self.second_language =
            Some(SubjectResult::new(key, Category::SecondLanguage).with_standard(standard));
        self
    }

    pub fn build(self) -> StudentInputSet {
        let mut builder = StudentInputSet::builder();
        for s in [
            self.korean,
            self.math,
            self.english,
            self.history,
            self.second_language,
        ]
        .into_iter()
        .flatten()
        {
            builder = builder.subject(s);
        }
        for e in self.electives {
            builder = builder.subject(e);
        }
        builder.build().expect("fixture student is valid")
    }
}

pub fn reference_student() -> StudentInputSet {
    StudentBuilder::reference().build()
}

pub fn science(key: &str, standard: u32, percentile: f64) -> SubjectResult {
    SubjectResult::new(key, Category::Science)
        .with_standard(standard)
        .with_percentile(percentile)
}

pub fn social(key: &str, standard: u32, percentile: f64) -> SubjectResult {
    SubjectResult::new(key, Category::Social)
        .with_standard(standard)
        .with_percentile(percentile)
}

/// Converted scores for programs "P1" and "P2".
///
/// P1 is the reference program. P2 mirrors it except that Physics I 69 holds
/// a coefficient label instead of a number.
pub fn reference_table() -> ScoreLookupTable {
    let mut b = ScoreLookupTable::builder();
    reference_rows(&mut b, "P1");
    reference_rows(&mut b, "P2");
    b.insert("Physics-I", "69", "P2", TableValue::Sentinel("가산".to_string()));
    b.build()
}

/// The P1 column under another program code.
pub fn reference_table_for(program: &str) -> ScoreLookupTable {
    let mut b = ScoreLookupTable::builder();
    reference_rows(&mut b, program);
    b.build()
}

/// Rows shared by every reference program column.
pub fn reference_rows(b: &mut LookupTableBuilder, program: &str) {
    b.number("Korean", "145", program, 72.5)
        .number("Korean", "140", program, 70.0)
        .number("Math-Calculus", "130", program, 65.0)
        .number("Math-Statistics", "130", program, 60.0)
        .number("English", "1", program, 100.0)
        .number("English", "2", program, 95.0)
        .number("Korean-History", "1", program, 10.0)
        .number("Korean-History", "2", program, 9.5)
        .number("Korean-History", "4", program, 40.0)
        .number("Physics-I", "69", program, 34.5)
        .number("Chemistry-I", "68", program, 34.0)
        .number("Life-and-Ethics", "65", program, 31.0)
        .number("Society-and-Culture", "66", program, 32.0)
        .number("French", "70", program, 35.0);
}

/// Korean + Math + English, history on top, best two science electives.
pub fn reference_spec(program: &str) -> ProgramFormulaSpec {
    ProgramFormulaSpec::builder()
        .program(program)
        .required(vec![Component::Korean, Component::Math, Component::English])
        .selections(vec![SelectionGroup::new(
            vec![Component::EachElective {
                pool: ElectivePool::Science,
            }],
            vec![1.0, 1.0],
        )])
        .history(HistoryPolicy::AddedUnconditionally)
        .build()
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}

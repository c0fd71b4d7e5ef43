use crate::error::{ScResult, ScoreError};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Exam area a subject belongs to. Decides which slot of a
/// [`StudentInputSet`] the result lands in and which raw value keys the lookup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Language,
    Math,
    ForeignLanguage,
    CivicHistory,
    Science,
    Social,
    SecondLanguage,
}

impl Category {
    /// English and Korean History are reported on the 1-9 grade scale only.
    pub fn is_grade_keyed(self) -> bool {
        matches!(self, Category::ForeignLanguage | Category::CivicHistory)
    }

    pub fn is_elective(self) -> bool {
        matches!(self, Category::Science | Category::Social)
    }
}

/// Which electives a component draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ElectivePool {
    Science,
    Social,
    Any,
}

impl ElectivePool {
    pub fn admits(self, category: Category) -> bool {
        match self {
            ElectivePool::Science => category == Category::Science,
            ElectivePool::Social => category == Category::Social,
            ElectivePool::Any => category.is_elective(),
        }
    }

    /// Upper bound on how many electives a student can hold in this pool.
    pub fn capacity(self) -> usize {
        match self {
            ElectivePool::Any => 2 * MAX_ELECTIVES_PER_CATEGORY,
            _ => MAX_ELECTIVES_PER_CATEGORY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "snake_case")]
pub enum MathTrack {
    Calculus,
    Geometry,
    Statistics,
}

impl MathTrack {
    pub fn subject_key(self) -> &'static str {
        match self {
            MathTrack::Calculus => "Math-Calculus",
            MathTrack::Geometry => "Math-Geometry",
            MathTrack::Statistics => "Math-Statistics",
        }
    }

    pub fn from_subject_key(key: &str) -> Option<Self> {
        match key {
            "Math-Calculus" => Some(MathTrack::Calculus),
            "Math-Geometry" => Some(MathTrack::Geometry),
            "Math-Statistics" => Some(MathTrack::Statistics),
            _ => None,
        }
    }
}

pub const MAX_ELECTIVES_PER_CATEGORY: usize = 2;

/// Highest standard score any exam area has ever reported, with headroom.
pub const MAX_STANDARD_SCORE: u32 = 200;

/// One examined subject for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub key: String,
    pub category: Category,
    #[serde(default)]
    pub standard_score: Option<u32>,
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub percentile: Option<f64>,
}

impl SubjectResult {
    pub fn new(key: impl Into<String>, category: Category) -> Self {
        Self {
            key: key.into(),
            category,
            standard_score: None,
            grade: None,
            percentile: None,
        }
    }

    pub fn with_standard(mut self, score: u32) -> Self {
        self.standard_score = Some(score);
        self
    }

    pub fn with_grade(mut self, grade: u8) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }

    /// Row key into the lookup table: grade for grade-keyed categories,
    /// standard score otherwise. `None` when that value was not reported.
    pub fn lookup_key(&self) -> Option<String> {
        if self.category.is_grade_keyed() {
            self.grade.map(|g| g.to_string())
        } else {
            self.standard_score.map(|s| s.to_string())
        }
    }

    pub fn math_track(&self) -> Option<MathTrack> {
        MathTrack::from_subject_key(&self.key)
    }

    /// Level-two science electives ("Physics-II" and friends).
    pub fn is_advanced(&self) -> bool {
        self.key.ends_with("-II")
    }
}

/// All results for one calculation request. Fields are private; build through
/// [`StudentInputSet::builder`] so the slot rules are enforced once.
/// Deserialization goes through the same builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InputSetFields")]
pub struct StudentInputSet {
    language: Option<SubjectResult>,
    math: Option<SubjectResult>,
    foreign_language: Option<SubjectResult>,
    civic_history: Option<SubjectResult>,
    science: Vec<SubjectResult>,
    social_studies: Vec<SubjectResult>,
    second_language: Option<SubjectResult>,
}

impl StudentInputSet {
    pub fn builder() -> InputSetBuilder {
        InputSetBuilder::default()
    }

    /// Single-slot categories. Electives go through [`Self::electives`].
    pub fn subject(&self, category: Category) -> Option<&SubjectResult> {
        match category {
            Category::Language => self.language.as_ref(),
            Category::Math => self.math.as_ref(),
            Category::ForeignLanguage => self.foreign_language.as_ref(),
            Category::CivicHistory => self.civic_history.as_ref(),
            Category::SecondLanguage => self.second_language.as_ref(),
            Category::Science => self.science.first(),
            Category::Social => self.social_studies.first(),
        }
    }

    pub fn electives(&self, pool: ElectivePool) -> Vec<&SubjectResult> {
        self.science
            .iter()
            .chain(self.social_studies.iter())
            .filter(|s| pool.admits(s.category))
            .collect()
    }

    pub fn science(&self) -> &[SubjectResult] {
        &self.science
    }

    pub fn social_studies(&self) -> &[SubjectResult] {
        &self.social_studies
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectResult> {
        self.language
            .iter()
            .chain(self.math.iter())
            .chain(self.foreign_language.iter())
            .chain(self.civic_history.iter())
            .chain(self.science.iter())
            .chain(self.social_studies.iter())
            .chain(self.second_language.iter())
    }

    pub fn math_track(&self) -> Option<MathTrack> {
        self.math.as_ref().and_then(|m| m.math_track())
    }
}

/// Serialized layout of a [`StudentInputSet`], before the slot rules run.
#[derive(Deserialize)]
struct InputSetFields {
    #[serde(default)]
    language: Option<SubjectResult>,
    #[serde(default)]
    math: Option<SubjectResult>,
    #[serde(default)]
    foreign_language: Option<SubjectResult>,
    #[serde(default)]
    civic_history: Option<SubjectResult>,
    #[serde(default)]
    science: Vec<SubjectResult>,
    #[serde(default)]
    social_studies: Vec<SubjectResult>,
    #[serde(default)]
    second_language: Option<SubjectResult>,
}

impl TryFrom<InputSetFields> for StudentInputSet {
    type Error = ScoreError;

    fn try_from(fields: InputSetFields) -> ScResult<Self> {
        let slots = [
            (Category::Language, Vec::from_iter(fields.language)),
            (Category::Math, Vec::from_iter(fields.math)),
            (Category::ForeignLanguage, Vec::from_iter(fields.foreign_language)),
            (Category::CivicHistory, Vec::from_iter(fields.civic_history)),
            (Category::Science, fields.science),
            (Category::Social, fields.social_studies),
            (Category::SecondLanguage, Vec::from_iter(fields.second_language)),
        ];

        let mut builder = StudentInputSet::builder();
        for (slot, results) in slots {
            for result in results {
                if result.category != slot {
                    return Err(ScoreError::Validation(format!(
                        "{} ({}) listed under {}",
                        result.key, result.category, slot
                    )));
                }
                builder = builder.subject(result);
            }
        }
        builder.build()
    }
}

#[derive(Debug, Default)]
pub struct InputSetBuilder {
    set: StudentInputSet,
    errors: Vec<String>,
}

impl InputSetBuilder {
    pub fn subject(mut self, result: SubjectResult) -> Self {
        let slot = match result.category {
            Category::Language => &mut self.set.language,
            Category::Math => &mut self.set.math,
            Category::ForeignLanguage => &mut self.set.foreign_language,
            Category::CivicHistory => &mut self.set.civic_history,
            Category::SecondLanguage => &mut self.set.second_language,
            Category::Science | Category::Social => {
                let pool = if result.category == Category::Science {
                    &mut self.set.science
                } else {
                    &mut self.set.social_studies
                };
                if pool.len() >= MAX_ELECTIVES_PER_CATEGORY {
                    self.errors.push(format!(
                        "more than {} {} electives (extra: {})",
                        MAX_ELECTIVES_PER_CATEGORY, result.category, result.key
                    ));
                } else if pool.iter().any(|s| s.key == result.key) {
                    self.errors
                        .push(format!("elective {} reported twice", result.key));
                } else {
                    pool.push(result);
                }
                return self;
            }
        };

        if let Some(existing) = slot.as_ref() {
            self.errors.push(format!(
                "{} already holds {}, cannot also hold {}",
                result.category, existing.key, result.key
            ));
        } else {
            *slot = Some(result);
        }
        self
    }

    pub fn build(self) -> ScResult<StudentInputSet> {
        if self.errors.is_empty() {
            Ok(self.set)
        } else {
            Err(ScoreError::Validation(self.errors.join("; ")))
        }
    }
}

//! Turns loosely labelled exam records into a [`StudentInputSet`].
//!
//! Records arrive with whatever labels the upstream form used ("미적분",
//! "Calculus", "물리학 Ⅰ", "물리1", ...). Everything downstream keys on the
//! canonical subject keys produced here.

use crate::error::{ScResult, ScoreError};
use crate::subject::{Category, MathTrack, StudentInputSet, SubjectResult, MAX_STANDARD_SCORE};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// One row as handed over by the input form / persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubjectRecord {
    pub category: String,
    pub subject_label: String,
    #[serde(default)]
    pub standard_score: Option<String>,
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub percentile: Option<f64>,
}

impl RawSubjectRecord {
    pub fn new(category: &str, label: &str) -> Self {
        Self {
            category: category.to_string(),
            subject_label: label.to_string(),
            standard_score: None,
            grade: None,
            percentile: None,
        }
    }

    pub fn standard(mut self, score: &str) -> Self {
        self.standard_score = Some(score.to_string());
        self
    }

    pub fn grade(mut self, grade: u8) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }
}

/// Category column as written upstream: an alias, the snake_case category
/// name, or "research" for electives classified by label.
enum RawCategory {
    Known(Category),
    Research,
}

fn parse_category(raw: &str) -> Option<RawCategory> {
    let c = raw.trim().to_ascii_lowercase();
    let known = match c.as_str() {
        "kor" | "korean" => Category::Language,
        "mathematics" => Category::Math,
        "eng" | "english" | "foreignlanguage" => Category::ForeignLanguage,
        "history" | "korean_history" | "civichistory" => Category::CivicHistory,
        "society" | "social_studies" | "socialstudies" => Category::Social,
        "lang" | "secondlanguage" => Category::SecondLanguage,
        "research" | "elective" | "inquiry" => return Some(RawCategory::Research),
        canonical => return Category::from_str(canonical).ok().map(RawCategory::Known),
    };
    Some(RawCategory::Known(known))
}

/// Uppercased label with spacing and punctuation stripped, roman numerals as digits.
fn compact(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '(' | ')' | '·' | '.'))
        .map(|c| match c {
            'Ⅰ' => '1',
            'Ⅱ' => '2',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

pub fn canonical_math(label: &str) -> Option<MathTrack> {
    let c = compact(label);
    let c = c
        .strip_prefix("수학")
        .or_else(|| c.strip_prefix("MATH"))
        .unwrap_or(&c);
    match c {
        "미적분" | "미적" | "미적분2" | "CALCULUS" => Some(MathTrack::Calculus),
        "기하" | "GEOMETRY" => Some(MathTrack::Geometry),
        "확률과통계" | "확통" | "PROBABILITY" | "STATISTICS" | "PROBABILITYANDSTATISTICS" => {
            Some(MathTrack::Statistics)
        }
        _ => None,
    }
}

const SCIENCE_STEMS: &[(&[&str], &str)] = &[
    (&["물리학", "물리", "PHYSICS"], "Physics"),
    (&["화학", "CHEMISTRY"], "Chemistry"),
    (&["생명과학", "생물", "LIFESCIENCE", "BIOLOGY"], "Life-Science"),
    (&["지구과학", "지구", "EARTHSCIENCE"], "Earth-Science"),
];

const SOCIAL_SUBJECTS: &[(&[&str], &str)] = &[
    (&["생활과윤리", "생윤", "LIFEANDETHICS"], "Life-and-Ethics"),
    (&["윤리와사상", "윤사", "ETHICSANDTHOUGHT"], "Ethics-and-Thought"),
    (&["한국지리", "한지", "KOREANGEOGRAPHY"], "Korean-Geography"),
    (&["세계지리", "세지", "WORLDGEOGRAPHY"], "World-Geography"),
    (&["동아시아사", "동아시아", "EASTASIANHISTORY"], "East-Asian-History"),
    (&["세계사", "WORLDHISTORY"], "World-History"),
    (&["경제", "ECONOMICS"], "Economics"),
    (&["정치와법", "정법", "POLITICSANDLAW"], "Politics-and-Law"),
    (&["사회문화", "사문", "SOCIETYANDCULTURE"], "Society-and-Culture"),
];

/// Canonical key and category of an elective label, if it is one we know.
pub fn canonical_elective(label: &str) -> Option<(String, Category)> {
    let c = compact(label);

    let (stem, level) = if let Some(s) = c.strip_suffix("II").or_else(|| c.strip_suffix('2')) {
        (s, Some("II"))
    } else if let Some(s) = c.strip_suffix('I').or_else(|| c.strip_suffix('1')) {
        (s, Some("I"))
    } else {
        (c.as_str(), None)
    };

    if let Some(level) = level {
        for (aliases, name) in SCIENCE_STEMS {
            if aliases.contains(&stem) {
                return Some((format!("{}-{}", name, level), Category::Science));
            }
        }
    }

    SOCIAL_SUBJECTS
        .iter()
        .find(|(aliases, _)| aliases.contains(&c.as_str()))
        .map(|(_, name)| (name.to_string(), Category::Social))
}

/// Unknown research labels: a science discipline stem anywhere means science.
fn classify_research_label(label: &str) -> Category {
    let c = compact(label);
    let is_science = SCIENCE_STEMS
        .iter()
        .flat_map(|(aliases, _)| aliases.iter())
        .any(|stem| c.contains(stem));
    if is_science {
        Category::Science
    } else {
        Category::Social
    }
}

fn parse_standard(raw: &Option<String>, label: &str) -> ScResult<Option<u32>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.parse::<u32>() {
            Ok(score) if score <= MAX_STANDARD_SCORE => Ok(Some(score)),
            Ok(score) => Err(ScoreError::Validation(format!(
                "standard score {} for {} is above {}",
                score, label, MAX_STANDARD_SCORE
            ))),
            Err(_) => Err(ScoreError::Validation(format!(
                "standard score '{}' for {} is not a number",
                s, label
            ))),
        },
    }
}

fn normalize_record(record: &RawSubjectRecord) -> ScResult<SubjectResult> {
    let label = record.subject_label.trim();
    let raw_category = parse_category(&record.category).ok_or_else(|| {
        ScoreError::Validation(format!(
            "record '{}' has unclassifiable category '{}'",
            label, record.category
        ))
    })?;

    let (key, category) = match raw_category {
        RawCategory::Known(Category::Language) => ("Korean".to_string(), Category::Language),
        RawCategory::Known(Category::Math) => {
            let track = canonical_math(label).ok_or_else(|| {
                ScoreError::Validation(format!("unknown math track '{}'", label))
            })?;
            (track.subject_key().to_string(), Category::Math)
        }
        RawCategory::Known(Category::ForeignLanguage) => {
            ("English".to_string(), Category::ForeignLanguage)
        }
        RawCategory::Known(Category::CivicHistory) => {
            ("Korean-History".to_string(), Category::CivicHistory)
        }
        RawCategory::Known(Category::SecondLanguage) => {
            (label.to_string(), Category::SecondLanguage)
        }
        RawCategory::Known(declared) => match canonical_elective(label) {
            Some((key, found)) if found == declared => (key, declared),
            Some((key, found)) => {
                return Err(ScoreError::Validation(format!(
                    "{} is a {} elective, not {}",
                    key, found, declared
                )))
            }
            None => (label.to_string(), declared),
        },
        RawCategory::Research => match canonical_elective(label) {
            Some(found) => found,
            None => (label.to_string(), classify_research_label(label)),
        },
    };

    let grade = match record.grade {
        None | Some(0) => None,
        Some(g @ 1..=9) => Some(g),
        Some(g) => {
            return Err(ScoreError::Validation(format!(
                "grade {} for {} is outside 1-9",
                g, key
            )))
        }
    };

    let percentile = match record.percentile {
        Some(p) if !(0.0..=100.0).contains(&p) => {
            return Err(ScoreError::Validation(format!(
                "percentile {} for {} is outside 0-100",
                p, key
            )))
        }
        other => other,
    };

    Ok(SubjectResult {
        standard_score: parse_standard(&record.standard_score, &key)?,
        key,
        category,
        grade,
        percentile,
    })
}

/// Classify every record and assemble the input set.
///
/// When a student reports more than two electives in one category, the two
/// with the highest standard scores are kept.
pub fn normalize_records(records: &[RawSubjectRecord]) -> ScResult<StudentInputSet> {
    let mut singles = Vec::new();
    let mut science = Vec::new();
    let mut social = Vec::new();

    for record in records {
        let result = normalize_record(record)?;
        match result.category {
            Category::Science => science.push(result),
            Category::Social => social.push(result),
            _ => singles.push(result),
        }
    }

    let mut builder = StudentInputSet::builder();
    for result in singles {
        builder = builder.subject(result);
    }
    for pool in [science, social] {
        for result in keep_top_electives(pool) {
            builder = builder.subject(result);
        }
    }
    builder.build()
}

fn keep_top_electives(mut pool: Vec<SubjectResult>) -> Vec<SubjectResult> {
    if pool.len() > crate::subject::MAX_ELECTIVES_PER_CATEGORY {
        // Stable sort keeps input order among equal scores.
        pool.sort_by(|a, b| b.standard_score.cmp(&a.standard_score));
        let dropped: Vec<&str> = pool[crate::subject::MAX_ELECTIVES_PER_CATEGORY..]
            .iter()
            .map(|s| s.key.as_str())
            .collect();
        debug!("Dropping surplus electives: {:?}", dropped);
        pool.truncate(crate::subject::MAX_ELECTIVES_PER_CATEGORY);
    }
    pool
}

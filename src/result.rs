use crate::formula::SubjectRequirement;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Data-quality notes attached to an otherwise successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The table cell held a label, not a number. It was counted as 0.
    NonNumericLookupValue {
        subject: String,
        lookup_key: String,
        program: String,
        raw: String,
    },
    /// The spec asks for something the evaluator can only treat as 0.
    InvalidSpec { program: String, detail: String },
    /// The score came from a formula fitted to past results rather than a
    /// published rule.
    ProvisionalFormula { program: String, basis: String },
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("no formula or override registered for program '{program}'")]
    UnknownProgram { program: String },

    #[error("missing score data for {subject}: {detail}")]
    MissingScoreData { subject: String, detail: String },

    #[error("subject requirement not met: {requirement}")]
    RequirementNotMet { requirement: SubjectRequirement },

    #[error("computed score for '{program}' is not a finite number")]
    NonFiniteScore { program: String },
}

impl FailureReason {
    pub fn missing(subject: impl Into<String>, detail: impl Into<String>) -> Self {
        FailureReason::MissingScoreData {
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Required,
    History,
    Selection,
    Bonus,
    Override,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePart {
    pub kind: PartKind,
    pub label: String,
    pub value: f64,
}

/// How the final number was put together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub parts: Vec<ScorePart>,
    /// Sum of all parts before the correction factor.
    pub subtotal: f64,
    pub correction_factor: f64,
}

impl ScoreComponents {
    pub fn total_of(&self, kind: PartKind) -> f64 {
        self.parts
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.value)
            .sum()
    }

    pub fn part(&self, label: &str) -> Option<f64> {
        self.parts.iter().find(|p| p.label == label).map(|p| p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionScore {
    pub score: f64,
    pub components: ScoreComponents,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

/// Outcome of one (program, student) calculation. Never half-filled: either a
/// score with its breakdown, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CalculationResult {
    Success(ConversionScore),
    Failure(FailureReason),
}

impl CalculationResult {
    pub fn failure(reason: FailureReason) -> Self {
        CalculationResult::Failure(reason)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CalculationResult::Success(_))
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            CalculationResult::Success(s) => Some(s.score),
            CalculationResult::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            CalculationResult::Success(_) => None,
            CalculationResult::Failure(r) => Some(r),
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            CalculationResult::Success(s) => &s.warnings,
            CalculationResult::Failure(_) => &[],
        }
    }
}

//! Data-parameterised override families.
//!
//! Each family is a formula shape several programs share; the numbers
//! (weights, ratios, point tables) come from override definition files so they
//! can be audited against the reconciliation data that produced them.

use super::{finish, OverrideContext, ScoreOverride};
use crate::formula::resolve::Resolver;
use crate::formula::{Component, SourceKind};
use crate::result::{CalculationResult, FailureReason, PartKind, ScorePart};
use crate::select::weighted_select;
use crate::subject::{Category, ElectivePool, SubjectResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

fn provisional_by_default() -> bool {
    true
}

/// JSON object keys are strings, and serde cannot turn them into integers
/// once the family tag has been buffered.
fn percentile_table<'de, D>(deserializer: D) -> Result<BTreeMap<u8, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, f64>::deserialize(deserializer)?
        .into_iter()
        .map(|(k, v)| {
            k.trim()
                .parse::<u8>()
                .map(|k| (k, v))
                .map_err(|_| serde::de::Error::custom(format!("percentile key '{}' is not 0-100", k)))
        })
        .collect()
}

fn part(label: &str, value: f64) -> ScorePart {
    ScorePart {
        kind: PartKind::Override,
        label: label.to_string(),
        value,
    }
}

/// Weighted selection over converted scores, times a historical correction ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedSelection {
    pub candidates: Vec<Component>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub source: SourceKind,
    pub ratio: f64,
    pub basis: String,
    #[serde(default = "provisional_by_default")]
    pub provisional: bool,
}

impl CorrectedSelection {
    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        let mut resolver = Resolver::new(ctx.program, ctx.input, ctx.table);
        let mut values = Vec::new();
        for component in &self.candidates {
            match resolver.values(component, self.source) {
                Ok(v) => values.extend(v),
                Err(reason) => return CalculationResult::failure(reason),
            }
        }
        let selected = weighted_select(&values, &self.weights);
        debug!(
            "{}: corrected selection {} x {}",
            ctx.program, selected, self.ratio
        );
        finish(
            ctx.program,
            vec![part("weighted selection", selected)],
            self.ratio,
            resolver.into_warnings(),
            self.provisional.then_some(self.basis.as_str()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub component: Component,
    pub weight: f64,
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighting {
    #[serde(default)]
    pub label: Option<String>,
    pub terms: Vec<WeightedTerm>,
}

/// Highest of several complete linear weightings. Every term is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestOfWeightings {
    pub weightings: Vec<Weighting>,
    pub basis: String,
    #[serde(default = "provisional_by_default")]
    pub provisional: bool,
}

impl BestOfWeightings {
    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        let mut resolver = Resolver::new(ctx.program, ctx.input, ctx.table);
        let mut best: Option<(String, f64)> = None;

        for (i, weighting) in self.weightings.iter().enumerate() {
            let mut total = 0.0;
            for term in &weighting.terms {
                match resolver.required(&term.component, term.source) {
                    Ok(v) => total += term.weight * v,
                    Err(reason) => return CalculationResult::failure(reason),
                }
            }
            let label = weighting
                .label
                .clone()
                .unwrap_or_else(|| format!("weighting[{}]", i));
            debug!("{}: {} = {}", ctx.program, label, total);
            if best.as_ref().map_or(true, |(_, b)| total > *b) {
                best = Some((label, total));
            }
        }

        let parts = best
            .map(|(label, value)| vec![part(&label, value)])
            .unwrap_or_default();
        finish(
            ctx.program,
            parts,
            1.0,
            resolver.into_warnings(),
            self.provisional.then_some(self.basis.as_str()),
        )
    }
}

/// Per-area weights used by the percentile and standard-score families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub korean: f64,
    pub math: f64,
    pub english: f64,
    pub inquiry: f64,
}

fn grade_points(
    subject: Option<&SubjectResult>,
    label: &str,
    points: &[f64; 9],
) -> Result<f64, FailureReason> {
    let subject = subject.ok_or_else(|| FailureReason::missing(label, "no result reported"))?;
    let grade = subject
        .grade
        .ok_or_else(|| FailureReason::missing(&subject.key, "no grade reported"))?;
    points
        .get(usize::from(grade).wrapping_sub(1))
        .copied()
        .ok_or_else(|| FailureReason::missing(&subject.key, format!("grade {} has no points", grade)))
}

fn percentile_of(subject: Option<&SubjectResult>, label: &str) -> Result<f64, FailureReason> {
    let subject = subject.ok_or_else(|| FailureReason::missing(label, "no result reported"))?;
    subject
        .percentile
        .ok_or_else(|| FailureReason::missing(&subject.key, "no percentile reported"))
}

fn standard_of(subject: Option<&SubjectResult>, label: &str) -> Result<f64, FailureReason> {
    let subject = subject.ok_or_else(|| FailureReason::missing(label, "no result reported"))?;
    subject
        .standard_score
        .map(f64::from)
        .ok_or_else(|| FailureReason::missing(&subject.key, "no standard score reported"))
}

/// Best of several percentile blends, minus a history deduction:
/// `max_w(kor% * w.korean + math% * w.math + englishPoints[g] * w.english
/// + bestElective% * w.inquiry) - historyDeduction[g]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileBlend {
    pub weightings: Vec<BlendWeights>,
    /// Points for English grades 1 through 9.
    pub english_points: [f64; 9],
    /// Deduction for Korean History grades 1 through 9.
    pub history_deduction: [f64; 9],
    pub basis: String,
    #[serde(default = "provisional_by_default")]
    pub provisional: bool,
}

impl PercentileBlend {
    fn blend_inputs(&self, ctx: &OverrideContext<'_>) -> Result<[f64; 5], FailureReason> {
        let input = ctx.input;
        let korean = percentile_of(input.subject(Category::Language), "Korean")?;
        let math = percentile_of(input.subject(Category::Math), "Math")?;
        let english = grade_points(
            input.subject(Category::ForeignLanguage),
            "English",
            &self.english_points,
        )?;
        let deduction = grade_points(
            input.subject(Category::CivicHistory),
            "History",
            &self.history_deduction,
        )?;
        let mut best_elective = 0.0_f64;
        for subject in input.electives(ElectivePool::Any) {
            best_elective = best_elective.max(percentile_of(Some(subject), &subject.key)?);
        }
        Ok([korean, math, english, best_elective, deduction])
    }

    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        let [korean, math, english, elective, deduction] = match self.blend_inputs(ctx) {
            Ok(values) => values,
            Err(reason) => return CalculationResult::failure(reason),
        };

        let blend = self
            .weightings
            .iter()
            .map(|w| korean * w.korean + math * w.math + english * w.english + elective * w.inquiry)
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
            .unwrap_or(0.0);

        finish(
            ctx.program,
            vec![part("percentile blend", blend), part("history deduction", -deduction)],
            1.0,
            Vec::new(),
            self.provisional.then_some(self.basis.as_str()),
        )
    }
}

/// Weighted standard scores over their attainable maximum, scaled:
/// `scale * (kor*wk + math*wm + eng*we + Σ electivePoints*wi)
///        / (max*wk + max*wm + bestEnglish*we + 2*bestElective*wi)`.
///
/// Elective points come from percentile-keyed tables, one per pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStandard {
    pub weights: BlendWeights,
    pub max_standard: f64,
    pub english_points: [f64; 9],
    #[serde(deserialize_with = "percentile_table")]
    pub science_points: BTreeMap<u8, f64>,
    #[serde(deserialize_with = "percentile_table")]
    pub social_points: BTreeMap<u8, f64>,
    pub scale: f64,
    pub basis: String,
    #[serde(default = "provisional_by_default")]
    pub provisional: bool,
}

impl NormalizedStandard {
    fn elective_points(&self, subject: &SubjectResult) -> Result<f64, FailureReason> {
        let p = percentile_of(Some(subject), &subject.key)?;
        let table = match subject.category {
            Category::Science => &self.science_points,
            _ => &self.social_points,
        };
        if p.fract() != 0.0 {
            return Err(FailureReason::missing(
                &subject.key,
                format!("percentile {} is not a table row", p),
            ));
        }
        table
            .get(&(p as u8))
            .copied()
            .ok_or_else(|| FailureReason::missing(&subject.key, format!("no points for percentile {}", p)))
    }

    fn ratio(&self, ctx: &OverrideContext<'_>) -> Result<f64, FailureReason> {
        let input = ctx.input;
        let w = &self.weights;
        let korean = standard_of(input.subject(Category::Language), "Korean")?;
        let math = standard_of(input.subject(Category::Math), "Math")?;
        let english = grade_points(
            input.subject(Category::ForeignLanguage),
            "English",
            &self.english_points,
        )?;
        let mut electives = 0.0;
        for subject in input.electives(ElectivePool::Any) {
            electives += self.elective_points(subject)?;
        }

        let best_english = self.english_points.iter().copied().fold(0.0, f64::max);
        let best_elective = [&self.science_points, &self.social_points]
            .iter()
            .flat_map(|t| t.get(&100).copied())
            .fold(0.0, f64::max);

        let top = korean * w.korean + math * w.math + english * w.english + electives * w.inquiry;
        let bottom = self.max_standard * w.korean
            + self.max_standard * w.math
            + best_english * w.english
            + best_elective * w.inquiry * 2.0;
        debug!("{}: normalized {} / {}", ctx.program, top, bottom);
        Ok(top / bottom)
    }

    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        match self.ratio(ctx) {
            Ok(ratio) => finish(
                ctx.program,
                vec![part("normalized ratio", ratio)],
                self.scale,
                Vec::new(),
                self.provisional.then_some(self.basis.as_str()),
            ),
            Err(reason) => CalculationResult::failure(reason),
        }
    }
}

/// Every family an override definition file can name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum OverrideFamily {
    CorrectedSelection(CorrectedSelection),
    BestOfWeightings(BestOfWeightings),
    PercentileBlend(PercentileBlend),
    NormalizedStandard(NormalizedStandard),
}

impl ScoreOverride for OverrideFamily {
    fn name(&self) -> &str {
        match self {
            OverrideFamily::CorrectedSelection(_) => "corrected_selection",
            OverrideFamily::BestOfWeightings(_) => "best_of_weightings",
            OverrideFamily::PercentileBlend(_) => "percentile_blend",
            OverrideFamily::NormalizedStandard(_) => "normalized_standard",
        }
    }

    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        match self {
            OverrideFamily::CorrectedSelection(f) => f.calculate(ctx),
            OverrideFamily::BestOfWeightings(f) => f.calculate(ctx),
            OverrideFamily::PercentileBlend(f) => f.calculate(ctx),
            OverrideFamily::NormalizedStandard(f) => f.calculate(ctx),
        }
    }
}

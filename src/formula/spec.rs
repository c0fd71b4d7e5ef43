use crate::subject::{Category, ElectivePool, MathTrack, StudentInputSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;

/// A scoring term a formula can refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Component {
    Korean,
    Math,
    English,
    History,
    SecondLanguage,
    /// Sum of the best `take` electives in `pool`, as one value.
    BestElectives { pool: ElectivePool, take: usize },
    /// Every elective in `pool` as its own candidate.
    EachElective { pool: ElectivePool },
}

impl Component {
    /// Category of a single-subject component.
    pub fn category(&self) -> Option<Category> {
        match self {
            Component::Korean => Some(Category::Language),
            Component::Math => Some(Category::Math),
            Component::English => Some(Category::ForeignLanguage),
            Component::History => Some(Category::CivicHistory),
            Component::SecondLanguage => Some(Category::SecondLanguage),
            Component::BestElectives { .. } | Component::EachElective { .. } => None,
        }
    }

    /// Most candidate values this component can contribute to a selection group.
    pub fn max_candidates(&self) -> usize {
        match self {
            Component::EachElective { pool } => pool.capacity(),
            _ => 1,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Component::Korean => "Korean".to_string(),
            Component::Math => "Math".to_string(),
            Component::English => "English".to_string(),
            Component::History => "History".to_string(),
            Component::SecondLanguage => "SecondLanguage".to_string(),
            Component::BestElectives { pool, take } => format!("best {} {} electives", take, pool),
            Component::EachElective { pool } => format!("each {} elective", pool),
        }
    }
}

/// Where a selection candidate's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Program-specific converted score from the lookup table.
    #[default]
    Converted,
    /// The student's raw percentile.
    Percentile,
}

/// `Σ weights[i] * (i+1-th largest candidate value)`.
///
/// `weights[0]` applies to the best candidate. A student with fewer candidates
/// than weights simply gets 0 for the missing ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionGroup {
    pub candidates: Vec<Component>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub label: Option<String>,
}

impl SelectionGroup {
    pub fn new(candidates: Vec<Component>, weights: Vec<f64>) -> Self {
        Self {
            candidates,
            weights,
            source: SourceKind::Converted,
            label: None,
        }
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Upper bound on candidates any student can bring to this group.
    pub fn capacity(&self) -> usize {
        self.candidates.iter().map(Component::max_candidates).sum()
    }

    pub fn display_label(&self, index: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("selection[{}]", index))
    }
}

/// Treatment of the Korean History component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Converted history score is always added on top.
    AddedUnconditionally,
    /// History only counts if it wins a rank inside a selection group.
    FoldedIntoSelection,
    /// The program does not score history.
    NotScored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BonusTerm {
    Constant {
        amount: f64,
    },
    /// `factor * value(component)`, summed over the component's candidates.
    Scaled {
        component: Component,
        factor: f64,
        #[serde(default)]
        source: SourceKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BonusCondition {
    ScienceCountAtLeast { count: usize },
    MathTrackIn { tracks: Vec<MathTrack> },
    /// At least one level-two science elective.
    AdvancedScienceTaken,
    /// At least `count` science electives whose key starts with `prefix`.
    ScienceMatching { prefix: String, count: usize },
    /// Converted `component` strictly greater than converted `other`.
    Outranks {
        component: Component,
        other: Component,
    },
    All { conditions: Vec<BonusCondition> },
}

impl BonusCondition {
    /// Conditions that only look at which subjects were taken.
    pub(crate) fn holds_on_subjects(&self, input: &StudentInputSet) -> Option<bool> {
        match self {
            BonusCondition::ScienceCountAtLeast { count } => {
                Some(input.science().len() >= *count)
            }
            BonusCondition::MathTrackIn { tracks } => Some(
                input
                    .math_track()
                    .map(|t| tracks.contains(&t))
                    .unwrap_or(false),
            ),
            BonusCondition::AdvancedScienceTaken => {
                Some(input.science().iter().any(|s| s.is_advanced()))
            }
            BonusCondition::ScienceMatching { prefix, count } => Some(
                input
                    .science()
                    .iter()
                    .filter(|s| s.key.starts_with(prefix.as_str()))
                    .count()
                    >= *count,
            ),
            BonusCondition::Outranks { .. } | BonusCondition::All { .. } => None,
        }
    }
}

/// Additive (or, with a negative amount, subtractive) adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub term: BonusTerm,
    #[serde(default)]
    pub when: Option<BonusCondition>,
    #[serde(default)]
    pub label: Option<String>,
}

impl BonusRule {
    pub fn constant(amount: f64) -> Self {
        Self {
            term: BonusTerm::Constant { amount },
            when: None,
            label: None,
        }
    }

    pub fn scaled(component: Component, factor: f64, source: SourceKind) -> Self {
        Self {
            term: BonusTerm::Scaled {
                component,
                factor,
                source,
            },
            when: None,
            label: None,
        }
    }

    pub fn when(mut self, condition: BonusCondition) -> Self {
        self.when = Some(condition);
        self
    }

    pub fn display_label(&self, index: usize) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("bonus[{}]", index))
    }
}

/// Multiplier reconciling a formula with observed results, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub factor: f64,
    /// Where the number came from (reconciliation run, admissions office memo...).
    pub basis: String,
    /// Fitted rather than published.
    #[serde(default)]
    pub provisional: bool,
}

/// Subject combination a program insists on before it scores anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubjectRequirement {
    MathTrackIn { tracks: Vec<MathTrack> },
    ScienceCount { count: usize },
    SocialCount { count: usize },
}

impl SubjectRequirement {
    pub fn is_met(&self, input: &StudentInputSet) -> bool {
        match self {
            SubjectRequirement::MathTrackIn { tracks } => input
                .math_track()
                .map(|t| tracks.contains(&t))
                .unwrap_or(false),
            SubjectRequirement::ScienceCount { count } => input.science().len() >= *count,
            SubjectRequirement::SocialCount { count } => input.social_studies().len() >= *count,
        }
    }
}

impl fmt::Display for SubjectRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectRequirement::MathTrackIn { tracks } => {
                let names: Vec<String> = tracks.iter().map(|t| t.to_string()).collect();
                write!(f, "math track must be one of [{}]", names.join(", "))
            }
            SubjectRequirement::ScienceCount { count } => {
                write!(f, "{} science electives required", count)
            }
            SubjectRequirement::SocialCount { count } => {
                write!(f, "{} social electives required", count)
            }
        }
    }
}

/// Declarative scoring rule for one program code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct ProgramFormulaSpec {
    #[builder(setter(into))]
    pub program: String,
    /// Summed as-is. A missing subject here fails the calculation.
    #[serde(default)]
    #[builder(default)]
    pub required: Vec<Component>,
    #[serde(default)]
    #[builder(default)]
    pub selections: Vec<SelectionGroup>,
    pub history: HistoryPolicy,
    #[serde(default)]
    #[builder(default)]
    pub bonus: Vec<BonusRule>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub correction: Option<Correction>,
    #[serde(default)]
    #[builder(default)]
    pub requirements: Vec<SubjectRequirement>,
}

impl ProgramFormulaSpec {
    pub fn correction_factor(&self) -> f64 {
        self.correction.as_ref().map(|c| c.factor).unwrap_or(1.0)
    }

    /// Structural problems. None of these stop evaluation; they are logged
    /// at load time and weights past a group's capacity score 0.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let history_required = self.required.contains(&Component::History);
        let history_selectable = self
            .selections
            .iter()
            .any(|g| g.candidates.contains(&Component::History));

        match self.history {
            HistoryPolicy::AddedUnconditionally if history_required => issues
                .push("history is both added unconditionally and listed as required".to_string()),
            HistoryPolicy::FoldedIntoSelection if !history_selectable => issues
                .push("history is folded into selection but no group lists it".to_string()),
            _ => {}
        }

        for (i, group) in self.selections.iter().enumerate() {
            if group.weights.is_empty() {
                issues.push(format!("{} has no weights", group.display_label(i)));
            }
            if group.weights.len() > group.capacity() {
                issues.push(format!(
                    "{} has {} weights but at most {} candidates",
                    group.display_label(i),
                    group.weights.len(),
                    group.capacity()
                ));
            }
            if group.weights.iter().any(|w| !w.is_finite()) {
                issues.push(format!("{} has a non-finite weight", group.display_label(i)));
            }
        }

        if let Some(c) = &self.correction {
            if !c.factor.is_finite() || c.factor <= 0.0 {
                issues.push(format!("correction factor {} is not positive", c.factor));
            }
        }

        issues
    }
}

//! Program-specific exceptions to the generic formula.
//!
//! An override is resolved by program code (exact match first, then the
//! longest registered prefix) and replaces the generic evaluator entirely for
//! that code. Overrides return the same [`CalculationResult`] shape.

pub mod families;
pub mod registry;

pub use families::{
    BestOfWeightings, BlendWeights, CorrectedSelection, NormalizedStandard, OverrideFamily,
    PercentileBlend, WeightedTerm, Weighting,
};
pub use registry::{CodeMatch, OverrideDefinition, OverrideRegistry};

use crate::lookup::ScoreLookupTable;
use crate::result::{
    CalculationResult, ConversionScore, FailureReason, ScoreComponents, ScorePart, Warning,
};
use crate::subject::StudentInputSet;
use std::fmt;
use tracing::warn;

/// What an override gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct OverrideContext<'a> {
    pub program: &'a str,
    pub input: &'a StudentInputSet,
    pub table: &'a ScoreLookupTable,
}

pub trait ScoreOverride: Send + Sync {
    fn name(&self) -> &str;

    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult;
}

impl fmt::Debug for dyn ScoreOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScoreOverride({})", self.name())
    }
}

/// Plain function as an override. Handy for one-off programs.
pub struct FnOverride {
    name: String,
    func: fn(&OverrideContext<'_>) -> CalculationResult,
}

impl FnOverride {
    pub fn new(
        name: impl Into<String>,
        func: fn(&OverrideContext<'_>) -> CalculationResult,
    ) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl ScoreOverride for FnOverride {
    fn name(&self) -> &str {
        &self.name
    }

    fn calculate(&self, ctx: &OverrideContext<'_>) -> CalculationResult {
        (self.func)(ctx)
    }
}

/// Common tail of every family: finiteness check, provisional warning, result assembly.
pub(crate) fn finish(
    program: &str,
    parts: Vec<ScorePart>,
    factor: f64,
    mut warnings: Vec<Warning>,
    provisional_basis: Option<&str>,
) -> CalculationResult {
    let subtotal: f64 = parts.iter().map(|p| p.value).sum();
    let score = subtotal * factor;

    if !score.is_finite() {
        warn!("{}: override produced a non-finite score", program);
        return CalculationResult::failure(FailureReason::NonFiniteScore {
            program: program.to_string(),
        });
    }

    if let Some(basis) = provisional_basis {
        warn!("{}: provisional formula ({})", program, basis);
        warnings.push(Warning::ProvisionalFormula {
            program: program.to_string(),
            basis: basis.to_string(),
        });
    }

    CalculationResult::Success(ConversionScore {
        score,
        components: ScoreComponents {
            parts,
            subtotal,
            correction_factor: factor,
        },
        warnings,
    })
}

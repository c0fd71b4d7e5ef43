use super::resolve::Resolver;
use super::spec::{BonusTerm, Component, HistoryPolicy, ProgramFormulaSpec, SourceKind};
use crate::lookup::ScoreLookupTable;
use crate::result::{
    CalculationResult, ConversionScore, FailureReason, PartKind, ScoreComponents, ScorePart,
    Warning,
};
use crate::select::weighted_select;
use crate::subject::StudentInputSet;
use tracing::{debug, warn};

/// Scores `input` for `spec.program` with the generic formula.
///
/// Order: subject requirements, required components (history included when
/// added unconditionally), selection groups, bonus rules, correction factor.
/// Every failing required component is considered, the first one is reported.
pub fn evaluate(
    spec: &ProgramFormulaSpec,
    input: &StudentInputSet,
    table: &ScoreLookupTable,
) -> CalculationResult {
    let program = spec.program.as_str();

    if let Some(req) = spec.requirements.iter().find(|r| !r.is_met(input)) {
        debug!("{}: requirement not met: {}", program, req);
        return CalculationResult::failure(FailureReason::RequirementNotMet {
            requirement: req.clone(),
        });
    }

    let mut resolver = Resolver::new(program, input, table);
    let mut parts = Vec::new();
    let mut first_failure: Option<FailureReason> = None;

    let mut required: Vec<(PartKind, &Component)> = spec
        .required
        .iter()
        .map(|c| (PartKind::Required, c))
        .collect();
    if spec.history == HistoryPolicy::AddedUnconditionally {
        required.push((PartKind::History, &Component::History));
    }

    for (kind, component) in required {
        match resolver.required(component, SourceKind::Converted) {
            Ok(value) => parts.push(ScorePart {
                kind,
                label: component.label(),
                value,
            }),
            Err(reason) => {
                debug!("{}: {}", program, reason);
                first_failure.get_or_insert(reason);
            }
        }
    }
    if let Some(reason) = first_failure {
        return CalculationResult::failure(reason);
    }

    for (i, group) in spec.selections.iter().enumerate() {
        let mut candidates = Vec::new();
        for component in &group.candidates {
            match resolver.values(component, group.source) {
                Ok(values) => candidates.extend(values),
                Err(reason) => return CalculationResult::failure(reason),
            }
        }

        let label = group.display_label(i);
        if group.weights.len() > group.capacity() {
            let detail = format!(
                "{} has {} weights but at most {} candidates; extra ranks score 0",
                label,
                group.weights.len(),
                group.capacity()
            );
            warn!("{}: {}", program, detail);
            resolver.warnings.push(Warning::InvalidSpec {
                program: program.to_string(),
                detail,
            });
        }

        let value = weighted_select(&candidates, &group.weights);
        debug!(
            "{}: {} over {} candidates = {}",
            program,
            label,
            candidates.len(),
            value
        );
        parts.push(ScorePart {
            kind: PartKind::Selection,
            label,
            value,
        });
    }

    for (i, rule) in spec.bonus.iter().enumerate() {
        let applies = match &rule.when {
            Some(condition) => match resolver.condition_holds(condition) {
                Ok(held) => held,
                Err(reason) => return CalculationResult::failure(reason),
            },
            None => true,
        };
        if !applies {
            continue;
        }
        let value = match &rule.term {
            BonusTerm::Constant { amount } => *amount,
            BonusTerm::Scaled {
                component,
                factor,
                source,
            } => match resolver.optional(component, *source) {
                Ok(v) => factor * v,
                Err(reason) => return CalculationResult::failure(reason),
            },
        };
        parts.push(ScorePart {
            kind: PartKind::Bonus,
            label: rule.display_label(i),
            value,
        });
    }

    let subtotal: f64 = parts.iter().map(|p| p.value).sum();
    let factor = spec.correction_factor();
    let score = subtotal * factor;

    if !score.is_finite() {
        warn!("{}: non-finite score (subtotal {}, factor {})", program, subtotal, factor);
        return CalculationResult::failure(FailureReason::NonFiniteScore {
            program: program.to_string(),
        });
    }

    let mut warnings = resolver.into_warnings();
    if let Some(correction) = spec.correction.as_ref().filter(|c| c.provisional) {
        warnings.push(Warning::ProvisionalFormula {
            program: program.to_string(),
            basis: correction.basis.clone(),
        });
    }

    debug!("{}: score {} ({} parts)", program, score, parts.len());
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

use crate::engine::ConversionEngine;
use crate::ingest::ExpectedScore;
use crate::result::CalculationResult;
use crate::subject::StudentInputSet;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of checking one expected score against the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub program: String,
    pub expected: f64,
    pub result: CalculationResult,
    /// `computed - expected`, `None` when the engine produced no score.
    pub diff: Option<f64>,
    pub passed: bool,
}

/// Recomputes reconciliation rows and flags the ones that drift.
pub struct Verifier {
    engine: Arc<ConversionEngine>,
    tolerance: f64,
}

impl Verifier {
    pub fn new(engine: Arc<ConversionEngine>, tolerance: f64) -> Self {
        Self { engine, tolerance }
    }

    pub fn verify(&self, input: &StudentInputSet, row: &ExpectedScore) -> Verification {
        let result = self.engine.calculate_conversion_score(&row.program, input);
        let diff = result.score().map(|s| s - row.expected);
        let passed = diff.map(|d| d.abs() <= self.tolerance).unwrap_or(false);

        match (&result, diff) {
            (_, Some(d)) if !passed => warn!(
                "{}: mismatch. Expected: {:.4}, Calculated: {:.4}, Diff: {:.4}",
                row.program,
                row.expected,
                row.expected + d,
                d
            ),
            (CalculationResult::Failure(reason), _) => {
                warn!("{}: no score ({})", row.program, reason)
            }
            _ => {}
        }

        Verification {
            program: row.program.clone(),
            expected: row.expected,
            result,
            diff,
            passed,
        }
    }

    pub fn verify_all(&self, input: &StudentInputSet, rows: &[ExpectedScore]) -> Vec<Verification> {
        let checks: Vec<Verification> = rows.iter().map(|r| self.verify(input, r)).collect();
        let failed = checks.iter().filter(|c| !c.passed).count();
        info!(
            "Verification: {} of {} within tolerance {}",
            checks.len() - failed,
            checks.len(),
            self.tolerance
        );
        checks
    }
}

//! Single entry point for conversion-score calculations.

use crate::formula::{evaluate, SpecRegistry};
use crate::lookup::ScoreLookupTable;
use crate::overrides::{OverrideContext, OverrideRegistry};
use crate::result::{CalculationResult, FailureReason};
use crate::subject::StudentInputSet;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Read-only after construction; share it behind an `Arc` across threads.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ConversionEngine {
    #[builder(setter(into))]
    table: Arc<ScoreLookupTable>,
    #[builder(default)]
    specs: SpecRegistry,
    #[builder(default)]
    overrides: OverrideRegistry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramScore {
    pub program: String,
    pub result: CalculationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
    pub student: String,
    pub result: CalculationResult,
}

impl ConversionEngine {
    /// Override (exact, then prefix) if one matches, otherwise the generic
    /// evaluator with the registered spec, otherwise `UnknownProgram`.
    /// Results are passed through as produced.
    pub fn calculate_conversion_score(
        &self,
        program: &str,
        input: &StudentInputSet,
    ) -> CalculationResult {
        if let Some(ov) = self.overrides.find(program) {
            debug!("{}: dispatching to override '{}'", program, ov.name());
            let ctx = OverrideContext {
                program,
                input,
                table: &self.table,
            };
            return ov.calculate(&ctx);
        }

        match self.specs.get(program) {
            Some(spec) => evaluate(spec, input, &self.table),
            None => {
                debug!("{}: no override or spec", program);
                CalculationResult::failure(FailureReason::UnknownProgram {
                    program: program.to_string(),
                })
            }
        }
    }

    /// One student against many programs. Output order follows `programs`.
    pub fn calculate_many<S>(&self, programs: &[S], input: &StudentInputSet) -> Vec<ProgramScore>
    where
        S: AsRef<str> + Sync,
    {
        programs
            .par_iter()
            .map(|p| ProgramScore {
                program: p.as_ref().to_string(),
                result: self.calculate_conversion_score(p.as_ref(), input),
            })
            .collect()
    }

    /// Many students against one program, best score first.
    ///
    /// Failures sort after every success and keep their input order, as do
    /// students with equal scores.
    pub fn rank_students<S>(
        &self,
        program: &str,
        students: &[(S, StudentInputSet)],
    ) -> Vec<RankedStudent>
    where
        S: AsRef<str> + Sync,
    {
        let mut ranked: Vec<RankedStudent> = students
            .par_iter()
            .map(|(id, input)| RankedStudent {
                student: id.as_ref().to_string(),
                result: self.calculate_conversion_score(program, input),
            })
            .collect();

        ranked.sort_by(|a, b| match (a.result.score(), b.result.score()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ranked
    }

    /// Every program code with a spec or an exact override, sorted.
    pub fn programs(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .specs
            .codes()
            .into_iter()
            .chain(self.overrides.exact_codes())
            .map(str::to_string)
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    pub fn table(&self) -> &ScoreLookupTable {
        &self.table
    }

    pub fn specs(&self) -> &SpecRegistry {
        &self.specs
    }

    pub fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }
}

//! Component value resolution shared by the generic evaluator and overrides.

use super::spec::{BonusCondition, Component, SourceKind};
use crate::lookup::ScoreLookupTable;
use crate::result::{FailureReason, Warning};
use crate::select::top_n_sum;
use crate::subject::{StudentInputSet, SubjectResult};

/// Resolves component values for one (program, student) pair and collects the
/// warnings raised along the way.
pub struct Resolver<'a> {
    pub program: &'a str,
    pub input: &'a StudentInputSet,
    pub table: &'a ScoreLookupTable,
    pub warnings: Vec<Warning>,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a str, input: &'a StudentInputSet, table: &'a ScoreLookupTable) -> Self {
        Self {
            program,
            input,
            table,
            warnings: Vec::new(),
        }
    }

    /// Value of one reported subject. A reported subject that cannot be
    /// valued is a failure, never a silent zero.
    pub fn subject_value(
        &mut self,
        subject: &SubjectResult,
        source: SourceKind,
    ) -> Result<f64, FailureReason> {
        match source {
            SourceKind::Converted => {
                let key = subject.lookup_key().ok_or_else(|| {
                    let what = if subject.category.is_grade_keyed() {
                        "grade"
                    } else {
                        "standard score"
                    };
                    FailureReason::missing(&subject.key, format!("no {} reported", what))
                })?;
                self.table
                    .lookup(&subject.key, &key, self.program, &mut self.warnings)
                    .map_err(|miss| {
                        FailureReason::missing(
                            &subject.key,
                            format!("{} (key {}, program {})", miss, key, self.program),
                        )
                    })
            }
            SourceKind::Percentile => subject
                .percentile
                .ok_or_else(|| FailureReason::missing(&subject.key, "no percentile reported")),
        }
    }

    /// Candidate values a component brings. Empty when the student did not
    /// take the subject(s) at all.
    pub fn values(
        &mut self,
        component: &Component,
        source: SourceKind,
    ) -> Result<Vec<f64>, FailureReason> {
        let input = self.input;
        match component {
            Component::BestElectives { pool, take } => {
                let electives = input.electives(*pool);
                if electives.is_empty() {
                    return Ok(Vec::new());
                }
                let values = electives
                    .into_iter()
                    .map(|s| self.subject_value(s, source))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(vec![top_n_sum(&values, *take)])
            }
            Component::EachElective { pool } => input
                .electives(*pool)
                .into_iter()
                .map(|s| self.subject_value(s, source))
                .collect(),
            single => match single.category().and_then(|c| input.subject(c)) {
                Some(subject) => Ok(vec![self.subject_value(subject, source)?]),
                None => Ok(Vec::new()),
            },
        }
    }

    /// Sum of a component that must be present.
    pub fn required(
        &mut self,
        component: &Component,
        source: SourceKind,
    ) -> Result<f64, FailureReason> {
        let values = self.values(component, source)?;
        if values.is_empty() {
            return Err(FailureReason::missing(component.label(), "no result reported"));
        }
        Ok(values.iter().sum())
    }

    /// Sum of a component that may be absent (absent counts as 0).
    pub fn optional(
        &mut self,
        component: &Component,
        source: SourceKind,
    ) -> Result<f64, FailureReason> {
        Ok(self.values(component, source)?.iter().sum())
    }

    pub fn condition_holds(&mut self, condition: &BonusCondition) -> Result<bool, FailureReason> {
        if let Some(held) = condition.holds_on_subjects(self.input) {
            return Ok(held);
        }
        match condition {
            BonusCondition::Outranks { component, other } => {
                let lhs = self.optional(component, SourceKind::Converted)?;
                let rhs = self.optional(other, SourceKind::Converted)?;
                Ok(lhs > rhs)
            }
            BonusCondition::All { conditions } => {
                for c in conditions {
                    if !self.condition_holds(c)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

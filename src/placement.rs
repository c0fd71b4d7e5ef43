//! Indicators the ranking feature shows next to a conversion score. None of
//! these influence the score itself.

use crate::select::top_n_sum;
use crate::subject::{Category, ElectivePool, StudentInputSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Korean + Math + best two electives, by standard score. Missing values count
/// as 0; the sum saturates.
pub fn standard_score_sum(input: &StudentInputSet) -> u32 {
    let single = |c: Category| {
        input
            .subject(c)
            .and_then(|s| s.standard_score)
            .unwrap_or(0)
    };
    let electives: Vec<f64> = input
        .electives(ElectivePool::Any)
        .iter()
        .map(|s| f64::from(s.standard_score.unwrap_or(0)))
        .collect();
    single(Category::Language)
        .saturating_add(single(Category::Math))
        .saturating_add(top_n_sum(&electives, 2) as u32)
}

/// Score cut-offs for bands +5 down to -5. Anything below the last cut is -5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// `(level, minimum score)`, highest level first.
    pub levels: Vec<(i8, f64)>,
}

impl RiskThresholds {
    pub const FLOOR: i8 = -5;

    /// `None` for a zero or NaN score, or without thresholds. Any other score
    /// below the last cut is [`Self::FLOOR`].
    pub fn risk_level(&self, score: f64) -> Option<i8> {
        if self.levels.is_empty() || score.is_nan() || score == 0.0 {
            return None;
        }
        let level = self
            .levels
            .iter()
            .find(|(_, cut)| score >= *cut)
            .map(|(level, _)| *level)
            .unwrap_or(Self::FLOOR);
        Some(level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvantageRow {
    pub standard_sum: f64,
    /// Program code -> average conversion score of applicants with this sum.
    pub averages: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Advantage {
    pub optimal_score: f64,
    /// `my_score - optimal_score`.
    pub difference: f64,
}

/// Per-program averages indexed by standard-score sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvantageTable {
    pub rows: Vec<AdvantageRow>,
}

impl AdvantageTable {
    /// Compares `my_score` with the average at the row nearest to
    /// `standard_sum`. The first row wins ties.
    pub fn advantage(&self, program: &str, standard_sum: f64, my_score: f64) -> Option<Advantage> {
        let mut nearest: Option<&AdvantageRow> = None;
        for row in &self.rows {
            let closer = nearest.map_or(true, |n| {
                (row.standard_sum - standard_sum).abs() < (n.standard_sum - standard_sum).abs()
            });
            if closer {
                nearest = Some(row);
            }
        }
        let optimal_score = *nearest?.averages.get(program)?;
        Some(Advantage {
            optimal_score,
            difference: my_score - optimal_score,
        })
    }
}

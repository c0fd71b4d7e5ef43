use crate::result::Warning;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// A stored cell. A few programs keep a coefficient label instead of a point
/// value in their column; those cells are kept verbatim as `Sentinel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableValue {
    Number(f64),
    Sentinel(String),
}

impl TableValue {
    /// Parses a spreadsheet cell. Anything that is not a finite number is a sentinel.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => TableValue::Number(v),
            _ => TableValue::Sentinel(trimmed.to_string()),
        }
    }
}

/// Which level of the table had no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    Subject,
    RawScore,
    Program,
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMiss::Subject => write!(f, "subject not in table"),
            LookupMiss::RawScore => write!(f, "no row for raw score"),
            LookupMiss::Program => write!(f, "no column for program"),
        }
    }
}

type ProgramColumns = HashMap<String, TableValue>;
type RawScoreRows = HashMap<String, ProgramColumns>;

/// subject key -> raw score key -> program code -> converted value.
///
/// Built once by the ingestion side and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreLookupTable {
    subjects: HashMap<String, RawScoreRows>,
}

impl ScoreLookupTable {
    pub fn builder() -> LookupTableBuilder {
        LookupTableBuilder::default()
    }

    /// Raw cell access, no coercion.
    pub fn get(&self, subject: &str, key: &str, program: &str) -> Option<&TableValue> {
        self.subjects.get(subject)?.get(key)?.get(program)
    }

    /// Converted score for one subject row and program column.
    ///
    /// Sentinel cells resolve to `0.0` and push a
    /// [`Warning::NonNumericLookupValue`] onto `warnings`. There is no
    /// interpolation: an unlisted raw score is a miss.
    pub fn lookup(
        &self,
        subject: &str,
        key: &str,
        program: &str,
        warnings: &mut Vec<Warning>,
    ) -> Result<f64, LookupMiss> {
        let rows = self.subjects.get(subject).ok_or(LookupMiss::Subject)?;
        let columns = rows.get(key).ok_or(LookupMiss::RawScore)?;
        match columns.get(program).ok_or(LookupMiss::Program)? {
            TableValue::Number(v) => Ok(*v),
            TableValue::Sentinel(raw) => {
                warn!(
                    "Non-numeric cell '{}' at {}/{}/{}, using 0",
                    raw, subject, key, program
                );
                warnings.push(Warning::NonNumericLookupValue {
                    subject: subject.to_string(),
                    lookup_key: key.to_string(),
                    program: program.to_string(),
                    raw: raw.clone(),
                });
                Ok(0.0)
            }
        }
    }

    pub fn contains_program(&self, program: &str) -> bool {
        self.subjects
            .values()
            .flat_map(|rows| rows.values())
            .any(|cols| cols.contains_key(program))
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    /// Every stored cell as `(subject, key, program, value)`.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str, &TableValue)> {
        self.subjects.iter().flat_map(|(subject, rows)| {
            rows.iter().flat_map(move |(key, cols)| {
                cols.iter().map(move |(program, value)| {
                    (subject.as_str(), key.as_str(), program.as_str(), value)
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.subjects
            .values()
            .flat_map(|rows| rows.values())
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sentinel_count(&self) -> usize {
        self.entries()
            .filter(|(_, _, _, v)| matches!(v, TableValue::Sentinel(_)))
            .count()
    }
}

#[derive(Debug, Default)]
pub struct LookupTableBuilder {
    table: ScoreLookupTable,
}

impl LookupTableBuilder {
    /// Later inserts for the same cell replace earlier ones.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        key: impl Into<String>,
        program: impl Into<String>,
        value: TableValue,
    ) -> &mut Self {
        self.table
            .subjects
            .entry(subject.into())
            .or_default()
            .entry(key.into())
            .or_default()
            .insert(program.into(), value);
        self
    }

    pub fn number(
        &mut self,
        subject: impl Into<String>,
        key: impl Into<String>,
        program: impl Into<String>,
        value: f64,
    ) -> &mut Self {
        self.insert(subject, key, program, TableValue::Number(value))
    }

    pub fn build(self) -> ScoreLookupTable {
        self.table
    }
}

impl<S, K, P> FromIterator<(S, K, P, TableValue)> for ScoreLookupTable
where
    S: Into<String>,
    K: Into<String>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, K, P, TableValue)>>(iter: I) -> Self {
        let mut builder = ScoreLookupTable::builder();
        for (s, k, p, v) in iter {
            builder.insert(s, k, p, v);
        }
        builder.build()
    }
}

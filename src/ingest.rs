//! File loaders for the data the engine is built from. The engine itself
//! never touches the filesystem.

use crate::error::{ScResult, ScoreError};
use crate::formula::{ProgramFormulaSpec, SpecRegistry};
use crate::lookup::{ScoreLookupTable, TableValue};
use crate::normalizer::RawSubjectRecord;
use crate::overrides::{OverrideDefinition, OverrideRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lookup table from `subject,key,program,value` rows (header required).
pub fn load_lookup_table_csv<P: AsRef<Path>>(path: P) -> ScResult<ScoreLookupTable> {
    let file = File::open(path.as_ref())?;
    let table = lookup_table_from_csv_reader(file)?;
    info!(
        "Loaded {} table cells ({} non-numeric) from {}",
        table.len(),
        table.sentinel_count(),
        path.as_ref().display()
    );
    Ok(table)
}

/// Short or blank-keyed rows are skipped; a malformed CSV record is an error.
pub fn lookup_table_from_csv_reader<R: Read>(reader: R) -> ScResult<ScoreLookupTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut builder = ScoreLookupTable::builder();
    let mut skipped = 0;

    for result in rdr.records() {
        let rec = result?;
        if rec.len() < 4 || rec.iter().take(3).any(|f| f.trim().is_empty()) {
            skipped += 1;
            continue;
        }
        builder.insert(
            rec[0].trim(),
            rec[1].trim(),
            rec[2].trim(),
            TableValue::parse(&rec[3]),
        );
    }

    if skipped > 0 {
        debug!("Skipped {} incomplete table rows", skipped);
    }
    Ok(builder.build())
}

type NestedTable = HashMap<String, HashMap<String, HashMap<String, Value>>>;

/// Lookup table stored as `{subject: {key: {program: value}}}`. Null cells are
/// treated as absent.
pub fn load_lookup_table_json<P: AsRef<Path>>(path: P) -> ScResult<ScoreLookupTable> {
    let content = fs::read_to_string(path.as_ref())?;
    let table = lookup_table_from_json_str(&content)?;
    info!(
        "Loaded {} table cells ({} non-numeric) from {}",
        table.len(),
        table.sentinel_count(),
        path.as_ref().display()
    );
    Ok(table)
}

pub fn lookup_table_from_json_str(content: &str) -> ScResult<ScoreLookupTable> {
    let nested: NestedTable = serde_json::from_str(content)?;
    let mut builder = ScoreLookupTable::builder();
    for (subject, rows) in nested {
        for (key, columns) in rows {
            for (program, value) in columns {
                let cell = match value {
                    Value::Null => continue,
                    Value::Number(n) => match n.as_f64() {
                        Some(v) => TableValue::Number(v),
                        None => TableValue::Sentinel(n.to_string()),
                    },
                    Value::String(s) => TableValue::parse(&s),
                    other => TableValue::Sentinel(other.to_string()),
                };
                builder.insert(subject.as_str(), key.as_str(), program, cell);
            }
        }
    }
    Ok(builder.build())
}

/// Picks the loader by extension (`.json`, anything else is CSV).
pub fn load_lookup_table<P: AsRef<Path>>(path: P) -> ScResult<ScoreLookupTable> {
    let is_json = path
        .as_ref()
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        load_lookup_table_json(path)
    } else {
        load_lookup_table_csv(path)
    }
}

/// JSON array of specs. Duplicate program codes are rejected.
pub fn load_spec_registry<P: AsRef<Path>>(path: P) -> ScResult<SpecRegistry> {
    let content = fs::read_to_string(path.as_ref())?;
    let specs: Vec<ProgramFormulaSpec> = serde_json::from_str(&content)?;

    let mut registry = SpecRegistry::new();
    for spec in specs {
        let program = spec.program.clone();
        if registry.insert(spec).is_some() {
            return Err(ScoreError::Validation(format!(
                "program '{}' is defined twice in {}",
                program,
                path.as_ref().display()
            )));
        }
    }

    let issues = registry.issues().len();
    if issues > 0 {
        warn!("{} structural issues in loaded specs", issues);
    }
    info!(
        "Loaded {} program specs from {}",
        registry.len(),
        path.as_ref().display()
    );
    Ok(registry)
}

pub fn load_override_registry<P: AsRef<Path>>(path: P) -> ScResult<OverrideRegistry> {
    let content = fs::read_to_string(path.as_ref())?;
    let definitions: Vec<OverrideDefinition> = serde_json::from_str(&content)?;
    let registry = OverrideRegistry::from_definitions(definitions);
    info!(
        "Loaded {} override definitions from {}",
        registry.len(),
        path.as_ref().display()
    );
    Ok(registry)
}

/// JSON array of raw subject records for one student.
pub fn load_student_records<P: AsRef<Path>>(path: P) -> ScResult<Vec<RawSubjectRecord>> {
    let content = fs::read_to_string(path.as_ref())?;
    let records: Vec<RawSubjectRecord> = serde_json::from_str(&content)?;
    debug!(
        "Loaded {} subject records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

/// One row of a reconciliation sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedScore {
    pub program: String,
    pub expected: f64,
}

/// `program,expected` CSV with a header row.
pub fn load_expected_scores<P: AsRef<Path>>(path: P) -> ScResult<Vec<ExpectedScore>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<ExpectedScore>, csv::Error>>()?;
    info!(
        "Loaded {} expected scores from {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows)
}

use crate::error::{ScResult, ScoreError};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where the data lives and how the harness reports.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lookup table, `.csv` (subject,key,program,value) or nested `.json`.
    #[arg(long, default_value = "data/score_table.csv")]
    pub table_path: String,

    /// JSON array of program formula specs.
    #[arg(long, default_value = "data/program_specs.json")]
    pub specs_path: String,

    /// JSON array of override definitions.
    #[arg(long)]
    pub overrides_path: Option<String>,

    #[arg(long, default_value_t = 2)]
    pub display_precision: usize,

    /// Largest |expected - computed| still counted as a match.
    #[arg(long, default_value_t = 0.01)]
    pub verify_tolerance: f64,

    /// Evaluate batches on the current thread only.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_path: "data/score_table.csv".to_string(),
            specs_path: "data/program_specs.json".to_string(),
            overrides_path: None,
            display_precision: 2,
            verify_tolerance: 0.01,
            sequential: false,
        }
    }
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ScResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ScoreError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScResult<()> {
        if !self.verify_tolerance.is_finite() || self.verify_tolerance < 0.0 {
            return Err(ScoreError::Config(format!(
                "verify_tolerance must be a non-negative number, got {}",
                self.verify_tolerance
            )));
        }
        Ok(())
    }

    /// Copies over only the values the user typed on the command line.
    pub fn merge_from_cli(&mut self, cli: &EngineConfig, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(table_path);
        update_if_present!(specs_path);
        update_if_present!(overrides_path);
        update_if_present!(display_precision);
        update_if_present!(verify_tolerance);
        update_if_present!(sequential);
    }
}

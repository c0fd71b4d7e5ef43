use thiserror::Error;

/// Errors raised outside the evaluation path: loading data, reading config,
/// validating specs before they enter a registry.
///
/// Calculation failures never use this type; they travel inside
/// [`crate::result::CalculationResult`].
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type ScResult<T> = Result<T, ScoreError>;

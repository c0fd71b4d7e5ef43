pub mod config;
pub mod engine;
pub mod error;
pub mod formula;
pub mod ingest;
pub mod lookup;
pub mod normalizer;
pub mod overrides;
pub mod placement;
pub mod result;
pub mod select;
pub mod subject;
pub mod verifier;

pub use engine::ConversionEngine;
pub use error::{ScResult, ScoreError};
pub use result::{CalculationResult, FailureReason, Warning};
pub use subject::StudentInputSet;

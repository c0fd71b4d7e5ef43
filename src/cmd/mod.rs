pub mod calculate;
pub mod verify;

use jungsi_score::config::EngineConfig;
use jungsi_score::normalizer::normalize_records;
use jungsi_score::overrides::OverrideRegistry;
use jungsi_score::{ingest, ConversionEngine, ScResult, StudentInputSet};
use tracing::info;

pub fn load_engine(config: &EngineConfig) -> ScResult<ConversionEngine> {
    info!("Loading lookup table: {}", config.table_path);
    let table = ingest::load_lookup_table(&config.table_path)?;

    info!("Loading program specs: {}", config.specs_path);
    let specs = ingest::load_spec_registry(&config.specs_path)?;

    let overrides = match &config.overrides_path {
        Some(path) => ingest::load_override_registry(path)?,
        None => OverrideRegistry::new(),
    };

    Ok(ConversionEngine::builder()
        .table(table)
        .specs(specs)
        .overrides(overrides)
        .build())
}

pub fn load_student(path: &str) -> ScResult<StudentInputSet> {
    let records = ingest::load_student_records(path)?;
    normalize_records(&records)
}

use crate::reports;
use clap::Args;
use jungsi_score::config::EngineConfig;
use jungsi_score::ingest::load_expected_scores;
use jungsi_score::verifier::Verifier;
use jungsi_score::{ConversionEngine, ScResult};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub config: EngineConfig,

    /// JSON file with the student's raw subject records.
    #[arg(short, long)]
    pub student: String,

    /// `program,expected` CSV from a past reconciliation run.
    #[arg(short, long)]
    pub expected: String,
}

/// Exit code 1 when any row falls outside the tolerance.
pub fn run(args: &VerifyArgs, config: &EngineConfig, engine: Arc<ConversionEngine>) -> ScResult<i32> {
    let input = super::load_student(&args.student)?;
    let rows = load_expected_scores(&args.expected)?;

    let verifier = Verifier::new(engine, config.verify_tolerance);
    let checks = verifier.verify_all(&input, &rows);

    reports::print_verification(&checks, config.display_precision);

    let failed = checks.iter().filter(|c| !c.passed).count();
    println!("\n{} of {} rows match.", checks.len() - failed, checks.len());
    Ok(if failed > 0 { 1 } else { 0 })
}

use crate::reports;
use clap::Args;
use jungsi_score::config::EngineConfig;
use jungsi_score::placement::standard_score_sum;
use jungsi_score::{ConversionEngine, ScResult};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub config: EngineConfig,

    /// JSON file with the student's raw subject records.
    #[arg(short, long)]
    pub student: String,

    /// Program codes, comma separated. Every known program when omitted.
    #[arg(short, long, value_delimiter = ',')]
    pub programs: Vec<String>,
}

pub fn run(args: &CalculateArgs, config: &EngineConfig, engine: Arc<ConversionEngine>) -> ScResult<i32> {
    let input = super::load_student(&args.student)?;

    let programs = if args.programs.is_empty() {
        engine.programs()
    } else {
        args.programs.clone()
    };

    let results = engine.calculate_many(&programs[..], &input);
    if results.is_empty() {
        println!("No programs to calculate.");
        return Ok(0);
    }

    println!("\nStandard score sum: {}", standard_score_sum(&input));
    reports::print_results(&results, config.display_precision);
    Ok(0)
}

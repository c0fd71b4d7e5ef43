use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use jungsi_score::config::EngineConfig;
use jungsi_score::ScResult;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "Conversion-score reconciliation harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON settings file. Flags given on the command line win over it.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Calculate(cmd::calculate::CalculateArgs),
    Verify(cmd::verify::VerifyArgs),
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(
    path: Option<&str>,
    cli_config: &EngineConfig,
    sub_matches: Option<&ArgMatches>,
) -> ScResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(cli_config.clone());
    };
    info!("Loading settings from: {}", path);
    let mut config = EngineConfig::load_from_file(path)?;
    if let Some(m) = sub_matches {
        config.merge_from_cli(cli_config, m);
    }
    Ok(config)
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.debug);

    let (cli_config, sub_matches) = match &cli.command {
        Commands::Calculate(args) => (&args.config, matches.subcommand_matches("calculate")),
        Commands::Verify(args) => (&args.config, matches.subcommand_matches("verify")),
    };

    let config = resolve_config(cli.config.as_deref(), cli_config, sub_matches).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(2);
    });

    if config.sequential {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(1).build_global() {
            warn!("Could not restrict the thread pool: {}", e);
        }
    }

    let engine = match cmd::load_engine(&config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to load engine data: {}", e);
            process::exit(2);
        }
    };

    let outcome = match &cli.command {
        Commands::Calculate(args) => cmd::calculate::run(args, &config, engine),
        Commands::Verify(args) => cmd::verify::run(args, &config, engine),
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    }
}

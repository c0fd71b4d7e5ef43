use clap::{CommandFactory, FromArgMatches, Parser};
use jungsi_score::config::EngineConfig;
use jungsi_score::ScoreError;
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Parser, Debug)]
struct Harness {
    #[command(flatten)]
    config: EngineConfig,
}

fn parse(args: &[&str]) -> (EngineConfig, clap::ArgMatches) {
    let matches = Harness::command().get_matches_from(args);
    let harness = Harness::from_arg_matches(&matches).expect("args parse");
    (harness.config, matches)
}

#[test]
fn test_cli_defaults_match_default_impl() {
    let (config, _) = parse(&["harness"]);
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_file_values_survive_unless_flag_given() {
    let mut file_config = EngineConfig {
        table_path: "tables/2025.json".to_string(),
        display_precision: 1,
        verify_tolerance: 0.5,
        ..Default::default()
    };
    let (cli, matches) = parse(&["harness", "--display-precision", "4"]);

    file_config.merge_from_cli(&cli, &matches);

    assert_eq!(file_config.display_precision, 4);
    assert_eq!(file_config.verify_tolerance, 0.5);
    assert_eq!(file_config.table_path, "tables/2025.json");
}

#[test]
fn test_load_from_file_fills_missing_fields_with_defaults() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, r#"{{ "specs_path": "specs/2025.json", "sequential": true }}"#)
        .expect("write config");

    let config = EngineConfig::load_from_file(file.path()).expect("config loads");

    assert_eq!(config.specs_path, "specs/2025.json");
    assert!(config.sequential);
    assert_eq!(config.table_path, EngineConfig::default().table_path);
    assert_eq!(config.overrides_path, None);
}

#[test]
fn test_negative_tolerance_is_rejected() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, r#"{{ "verify_tolerance": -1.0 }}"#).expect("write config");

    let err = EngineConfig::load_from_file(file.path()).expect_err("tolerance is invalid");
    assert!(matches!(err, ScoreError::Config(_)));
}

#[test]
fn test_missing_config_file() {
    let err = EngineConfig::load_from_file("no/such/config.json").expect_err("file is missing");
    assert!(matches!(err, ScoreError::Config(msg) if msg.contains("no/such/config.json")));
}

mod common;

use common::*;
use jungsi_score::engine::ConversionEngine;
use jungsi_score::formula::SpecRegistry;
use jungsi_score::ingest::ExpectedScore;
use jungsi_score::result::FailureReason;
use jungsi_score::verifier::Verifier;
use std::sync::Arc;

fn verifier(tolerance: f64) -> Verifier {
    let specs: SpecRegistry = [reference_spec("P1"), reference_spec("P2")]
        .into_iter()
        .collect();
    let engine = ConversionEngine::builder()
        .table(reference_table())
        .specs(specs)
        .build();
    Verifier::new(Arc::new(engine), tolerance)
}

fn row(program: &str, expected: f64) -> ExpectedScore {
    ExpectedScore {
        program: program.to_string(),
        expected,
    }
}

#[test]
fn test_exact_match_passes() {
    let check = verifier(0.01).verify(&reference_student(), &row("P1", 316.0));

    assert!(check.passed);
    assert_eq!(check.diff, Some(0.0));
    assert_eq!(check.result.score(), Some(316.0));
}

#[test]
fn test_diff_is_computed_minus_expected() {
    let v = verifier(0.5);
    let input = reference_student();

    let within = v.verify(&input, &row("P1", 316.4));
    assert!(within.passed);

    let outside = v.verify(&input, &row("P1", 317.0));
    assert!(!outside.passed);
    assert_close(outside.diff.unwrap_or(f64::NAN), -1.0, 1e-9);
}

#[test]
fn test_engine_failure_never_passes() {
    let check = verifier(1000.0).verify(&reference_student(), &row("NOPE", 0.0));

    assert!(!check.passed);
    assert_eq!(check.diff, None);
    assert!(matches!(
        check.result.failure_reason(),
        Some(FailureReason::UnknownProgram { .. })
    ));
}

#[test]
fn test_verify_all_keeps_row_order() {
    let rows = vec![row("P2", 281.5), row("P1", 316.0), row("P1", 300.0)];
    let checks = verifier(0.01).verify_all(&reference_student(), &rows);

    let programs: Vec<&str> = checks.iter().map(|c| c.program.as_str()).collect();
    assert_eq!(programs, vec!["P2", "P1", "P1"]);
    let passed: Vec<bool> = checks.iter().map(|c| c.passed).collect();
    assert_eq!(passed, vec![true, true, false]);
}

use jungsi_score::formula::HistoryPolicy;
use jungsi_score::ingest::{
    load_expected_scores, load_lookup_table, load_spec_registry, load_student_records,
    lookup_table_from_csv_reader, lookup_table_from_json_str, ExpectedScore,
};
use jungsi_score::lookup::TableValue;
use jungsi_score::ScoreError;
use std::io::{Cursor, Write};
use tempfile::{Builder, NamedTempFile};

fn temp_with_suffix(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    write!(file, "{}", content).expect("write temp file");
    file
}

#[test]
fn test_csv_table_skips_incomplete_rows() {
    let data = "subject,key,program,value\n\
                Korean,145,P1,72.5\n\
                Physics-I,69,P2,가산\n\
                Korean,140\n\
                ,150,P1,75\n\
                English, 1 ,P1, 100 \n";
    let table = lookup_table_from_csv_reader(Cursor::new(data)).expect("csv loads");

    assert_eq!(table.len(), 3);
    assert_eq!(table.get("Korean", "145", "P1"), Some(&TableValue::Number(72.5)));
    assert_eq!(table.get("English", "1", "P1"), Some(&TableValue::Number(100.0)));
    assert_eq!(
        table.get("Physics-I", "69", "P2"),
        Some(&TableValue::Sentinel("가산".to_string()))
    );
}

#[test]
fn test_json_table_layout() {
    let json = r#"{
        "Korean": { "145": { "P1": 72.5, "P2": null } },
        "Physics-I": { "69": { "P1": "34.5", "P2": "가산" } }
    }"#;
    let table = lookup_table_from_json_str(json).expect("json loads");

    assert_eq!(table.len(), 3);
    assert_eq!(table.get("Korean", "145", "P2"), None);
    assert_eq!(table.get("Physics-I", "69", "P1"), Some(&TableValue::Number(34.5)));
    assert_eq!(table.sentinel_count(), 1);
}

#[test]
fn test_table_loader_picks_format_by_extension() {
    let csv = temp_with_suffix(".csv", "subject,key,program,value\nKorean,145,P1,72.5\n");
    let json = temp_with_suffix(".json", r#"{"Korean": {"145": {"P1": 72.5}}}"#);

    let from_csv = load_lookup_table(csv.path()).expect("csv loads");
    let from_json = load_lookup_table(json.path()).expect("json loads");
    assert_eq!(from_csv, from_json);
}

#[test]
fn test_missing_table_file_is_io_error() {
    let err = load_lookup_table("no/such/table.csv").expect_err("file is missing");
    assert!(matches!(err, ScoreError::Io(_)));
}

const SPECS: &str = r#"[
    {
        "program": "P1",
        "required": [{ "kind": "korean" }, { "kind": "math" }, { "kind": "english" }],
        "selections": [
            {
                "candidates": [{ "kind": "each_elective", "pool": "science" }],
                "weights": [1.0, 1.0]
            }
        ],
        "history": "added_unconditionally",
        "bonus": [
            { "term": { "kind": "constant", "amount": 5.0 },
              "when": { "kind": "science_count_at_least", "count": 2 } }
        ],
        "correction": { "factor": 1.02, "basis": "2024 reconciliation", "provisional": true },
        "requirements": [{ "kind": "math_track_in", "tracks": ["calculus", "geometry"] }]
    },
    { "program": "P2", "required": [{ "kind": "korean" }], "history": "not_scored" }
]"#;

#[test]
fn test_spec_registry_from_json() {
    let file = temp_with_suffix(".json", SPECS);
    let registry = load_spec_registry(file.path()).expect("specs load");

    assert_eq!(registry.codes(), vec!["P1", "P2"]);
    let p1 = registry.get("P1").expect("P1 present");
    assert_eq!(p1.history, HistoryPolicy::AddedUnconditionally);
    assert_eq!(p1.correction_factor(), 1.02);
    assert_eq!(p1.bonus.len(), 1);
    assert_eq!(p1.requirements.len(), 1);
    assert_eq!(registry.get("P2").map(|s| s.correction_factor()), Some(1.0));
    assert!(registry.issues().is_empty());
}

#[test]
fn test_spec_without_history_policy_is_rejected() {
    let file = temp_with_suffix(".json", r#"[{ "program": "P1", "required": [] }]"#);
    let err = load_spec_registry(file.path()).expect_err("history is mandatory");
    assert!(matches!(err, ScoreError::Json(_)));
}

#[test]
fn test_duplicate_program_is_rejected() {
    let file = temp_with_suffix(
        ".json",
        r#"[{ "program": "P1", "history": "not_scored" },
            { "program": "P1", "history": "not_scored" }]"#,
    );
    let err = load_spec_registry(file.path()).expect_err("duplicate code");
    assert!(matches!(err, ScoreError::Validation(msg) if msg.contains("P1")));
}

#[test]
fn test_student_records_and_expected_scores() {
    let student = temp_with_suffix(
        ".json",
        r#"[{ "category": "kor", "subjectLabel": "국어", "standardScore": "145" },
            { "category": "eng", "subjectLabel": "영어", "grade": 1 }]"#,
    );
    let expected = temp_with_suffix(".csv", "program,expected\nP1, 316.0\nP2,281.5\n");

    let records = load_student_records(student.path()).expect("records load");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].grade, Some(1));

    let rows = load_expected_scores(expected.path()).expect("expected scores load");
    assert_eq!(
        rows,
        vec![
            ExpectedScore {
                program: "P1".to_string(),
                expected: 316.0
            },
            ExpectedScore {
                program: "P2".to_string(),
                expected: 281.5
            },
        ]
    );
}

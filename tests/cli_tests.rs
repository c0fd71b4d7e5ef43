use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    _dir: TempDir,
    table_path: PathBuf,
    specs_path: PathBuf,
    student_path: PathBuf,
    dir_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let table_path = dir.path().join("table.csv");
        let specs_path = dir.path().join("specs.json");
        let student_path = dir.path().join("student.json");

        let mut table = File::create(&table_path).unwrap();
        writeln!(table, "subject,key,program,value").unwrap();
        for (subject, key, value) in [
            ("Korean", "145", "72.5"),
            ("Math-Calculus", "130", "65"),
            ("English", "1", "100"),
            ("Korean-History", "1", "10"),
            ("Physics-I", "69", "34.5"),
            ("Chemistry-I", "68", "34"),
        ] {
            writeln!(table, "{},{},P1,{}", subject, key, value).unwrap();
        }

        let mut specs = File::create(&specs_path).unwrap();
        write!(
            specs,
            r#"[{{
                "program": "P1",
                "required": [{{ "kind": "korean" }}, {{ "kind": "math" }}, {{ "kind": "english" }}],
                "selections": [{{
                    "candidates": [{{ "kind": "each_elective", "pool": "science" }}],
                    "weights": [1.0, 1.0]
                }}],
                "history": "added_unconditionally"
            }}]"#
        )
        .unwrap();

        let mut student = File::create(&student_path).unwrap();
        write!(
            student,
            r#"[
                {{ "category": "kor", "subjectLabel": "국어", "standardScore": "145", "percentile": 98 }},
                {{ "category": "math", "subjectLabel": "미적분", "standardScore": "130", "percentile": 95 }},
                {{ "category": "eng", "subjectLabel": "영어", "grade": 1 }},
                {{ "category": "history", "subjectLabel": "한국사", "grade": 1 }},
                {{ "category": "research", "subjectLabel": "물리학 Ⅰ", "standardScore": "69", "percentile": 96 }},
                {{ "category": "research", "subjectLabel": "화학Ⅰ", "standardScore": "68", "percentile": 93 }}
            ]"#
        )
        .unwrap();

        Self {
            dir_path: dir.path().to_path_buf(),
            _dir: dir,
            table_path,
            specs_path,
            student_path,
        }
    }

    fn expected_file(&self, name: &str, rows: &[(&str, f64)]) -> PathBuf {
        let path = self.dir_path.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "program,expected").unwrap();
        for (program, expected) in rows {
            writeln!(file, "{},{}", program, expected).unwrap();
        }
        path
    }

    fn run(&self, subcommand: &str, extra: &[&str]) -> Output {
        let mut args = vec![
            subcommand,
            "--table-path",
            self.table_path.to_str().unwrap(),
            "--specs-path",
            self.specs_path.to_str().unwrap(),
            "--student",
            self.student_path.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        Command::new(env!("CARGO_BIN_EXE_jungsi-score"))
            .args(&args)
            .output()
            .expect("Failed to execute binary")
    }
}

fn plain_stdout(output: &Output) -> String {
    let ansi = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    ansi.replace_all(&String::from_utf8_lossy(&output.stdout), "")
        .to_string()
}

/// Second column of the table row for `program`.
fn score_column(stdout: &str, program: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        if parts.len() > 2 && parts[1] == program {
            Some(parts[2].to_string())
        } else {
            None
        }
    })
}

#[test]
fn test_cli_calculate_prints_score() {
    let ctx = TestContext::new();
    let output = ctx.run("calculate", &["--programs", "P1"]);
    let stdout = plain_stdout(&output);

    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(stdout.contains("Standard score sum: 412"), "stdout:\n{}", stdout);
    assert_eq!(score_column(&stdout, "P1").as_deref(), Some("316.00"));
}

#[test]
fn test_cli_calculate_reports_unknown_program() {
    let ctx = TestContext::new();
    let output = ctx.run("calculate", &["--programs", "P1,NOPE"]);
    let stdout = plain_stdout(&output);

    assert!(output.status.success());
    let row = stdout
        .lines()
        .find(|l| l.contains("NOPE"))
        .expect("row for unknown program");
    assert!(row.contains("failed"), "row: {}", row);
}

#[test]
fn test_cli_display_precision() {
    let ctx = TestContext::new();
    let output = ctx.run("calculate", &["--programs", "P1", "--display-precision", "0"]);
    assert_eq!(
        score_column(&plain_stdout(&output), "P1").as_deref(),
        Some("316")
    );
}

#[test]
fn test_cli_verify_match() {
    let ctx = TestContext::new();
    let expected = ctx.expected_file("expected.csv", &[("P1", 316.0)]);
    let output = ctx.run("verify", &["--expected", expected.to_str().unwrap()]);
    let stdout = plain_stdout(&output);

    assert_eq!(output.status.code(), Some(0), "stdout:\n{}", stdout);
    assert!(stdout.contains("1 of 1 rows match."));
}

#[test]
fn test_cli_verify_mismatch_sets_exit_code() {
    let ctx = TestContext::new();
    let expected = ctx.expected_file("expected.csv", &[("P1", 316.0), ("P1", 320.5)]);
    let output = ctx.run("verify", &["--expected", expected.to_str().unwrap()]);
    let stdout = plain_stdout(&output);

    assert_eq!(output.status.code(), Some(1), "stdout:\n{}", stdout);
    assert!(stdout.contains("MISMATCH"));
    assert!(stdout.contains("1 of 2 rows match."));
}

#[test]
fn test_cli_missing_table_exits_with_two() {
    let ctx = TestContext::new();
    let output = Command::new(env!("CARGO_BIN_EXE_jungsi-score"))
        .args([
            "calculate",
            "--table-path",
            "no/such/table.csv",
            "--specs-path",
            ctx.specs_path.to_str().unwrap(),
            "--student",
            ctx.student_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute binary");
    assert_eq!(output.status.code(), Some(2));
}

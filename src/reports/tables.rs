use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use jungsi_score::engine::ProgramScore;
use jungsi_score::verifier::Verification;
use jungsi_score::{CalculationResult, Warning};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn right_align(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn warning_summary(warnings: &[Warning]) -> String {
    warnings
        .iter()
        .map(|w| match w {
            Warning::NonNumericLookupValue { subject, raw, .. } => {
                format!("{} cell '{}' read as 0", subject, raw)
            }
            Warning::InvalidSpec { detail, .. } => detail.clone(),
            Warning::ProvisionalFormula { basis, .. } => format!("provisional: {}", basis),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn results(results: &[ProgramScore], precision: usize) {
    let mut table = new_table();

    table.add_row(vec![
        Cell::new("Program").add_attribute(Attribute::Bold),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Subtotal"),
        Cell::new("Factor"),
        Cell::new("Status"),
        Cell::new("Notes"),
    ]);
    right_align(&mut table, 1..=3);

    for r in results {
        match &r.result {
            CalculationResult::Success(s) => table.add_row(vec![
                Cell::new(&r.program).add_attribute(Attribute::Bold),
                Cell::new(format!("{:.*}", precision, s.score)).fg(Color::Cyan),
                Cell::new(format!("{:.*}", precision, s.components.subtotal)),
                Cell::new(format!("{}", s.components.correction_factor)),
                Cell::new("ok").fg(Color::Green),
                Cell::new(warning_summary(&s.warnings)).fg(Color::Yellow),
            ]),
            CalculationResult::Failure(reason) => table.add_row(vec![
                Cell::new(&r.program).add_attribute(Attribute::Bold),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("failed").fg(Color::Red),
                Cell::new(reason.to_string()),
            ]),
        };
    }
    println!("\n{}", table);
}

pub fn verification(checks: &[Verification], precision: usize) {
    let mut table = new_table();

    table.add_row(vec![
        Cell::new("Program").add_attribute(Attribute::Bold),
        Cell::new("Expected"),
        Cell::new("Computed").fg(Color::Cyan),
        Cell::new("Diff"),
        Cell::new("Result"),
    ]);
    right_align(&mut table, 1..=3);

    for c in checks {
        let computed = c
            .result
            .score()
            .map(|s| format!("{:.*}", precision, s))
            .unwrap_or_else(|| "-".to_string());
        let diff = c
            .diff
            .map(|d| format!("{:+.*}", precision, d))
            .unwrap_or_else(|| "-".to_string());
        let verdict = match (&c.result, c.passed) {
            (_, true) => Cell::new("match").fg(Color::Green),
            (CalculationResult::Failure(reason), _) => Cell::new(reason.to_string()).fg(Color::Red),
            _ => Cell::new("MISMATCH").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&c.program).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.*}", precision, c.expected)),
            Cell::new(computed).fg(Color::Cyan),
            Cell::new(diff),
            verdict,
        ]);
    }
    println!("\n{}", table);
}

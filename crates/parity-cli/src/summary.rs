//! Terminal rendering of validation runs, suggestions and templates.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use parity_model::{RuleResult, RuleStatus, ValidationRun};
use parity_validate::TemplateTest;

/// Results of a run, one row per rule in configuration order.
pub fn results_table(run: &ValidationRun) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Rule"),
        header_cell("Column"),
        header_cell("Left"),
        header_cell("Right"),
        header_cell("Status"),
        header_cell("Explanation"),
    ]);
    apply_results_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);

    for (index, result) in run.results().iter().enumerate() {
        table.add_row(vec![
            dim_cell(index + 1),
            Cell::new(result.rule_name()).add_attribute(Attribute::Bold),
            optional_cell(result.column()),
            Cell::new(result.left_value()),
            Cell::new(result.right_value()),
            status_cell(result.status()),
            explanation_cell(result),
        ]);
    }
    table.add_row(vec![
        dim_cell("-"),
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(run.fail_count(), Color::Red).add_attribute(Attribute::Bold),
        Cell::new(summary_line(run)).add_attribute(Attribute::Bold),
    ]);
    table
}

/// One-line pass/fail summary.
pub fn summary_line(run: &ValidationRun) -> String {
    let rules = if run.total() == 1 { "rule" } else { "rules" };
    format!(
        "{} {rules}: {} passed, {} failed",
        run.total(),
        run.pass_count(),
        run.fail_count()
    )
}

/// `FAIL <rule> (<column>): <explanation>` for every failed rule.
pub fn failure_lines(run: &ValidationRun) -> Vec<String> {
    run.failures()
        .map(|result| match result.column() {
            Some(column) => format!(
                "{} {} ({column}): {}",
                result.status(),
                result.rule_name(),
                result.explanation()
            ),
            None => format!(
                "{} {}: {}",
                result.status(),
                result.rule_name(),
                result.explanation()
            ),
        })
        .collect()
}

pub fn print_run_summary(legacy: &str, migrated: &str, run: &ValidationRun) {
    println!("Legacy: {legacy}");
    println!("Migrated: {migrated}");
    println!("{}", results_table(run));
    println!("{}", summary_line(run));
    let failures = failure_lines(run);
    if !failures.is_empty() {
        eprintln!("Failures:");
        for line in failures {
            eprintln!("- {line}");
        }
    }
}

/// Column suggestions per rule kind.
pub fn suggestions_table(rows: &[(String, Vec<String>, Option<String>)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Suggested columns"),
        header_cell("Default"),
    ]);
    apply_table_style(&mut table);
    for (rule, suggestions, default) in rows {
        let suggested = if suggestions.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(suggestions.join(", "))
        };
        table.add_row(vec![
            Cell::new(rule).add_attribute(Attribute::Bold),
            suggested,
            optional_cell(default.as_deref()),
        ]);
    }
    table
}

/// Canned tests of one table with their SQL labels.
pub fn templates_table(table_name: &str, target_table: &str, tests: &[TemplateTest]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Test"),
        header_cell("Rule"),
        header_cell("Column"),
        header_cell("Tolerance"),
        header_cell("SQL"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    for test in tests {
        table.add_row(vec![
            Cell::new(table_name).fg(Color::Blue),
            Cell::new(test.name).add_attribute(Attribute::Bold),
            Cell::new(test.kind.label()),
            optional_cell(test.column),
            Cell::new(test.tolerance),
            dim_cell(test.sql(target_table)),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_results_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 7 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(3)),
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::UpperBoundary(Width::Percentage(50)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: RuleStatus) -> Cell {
    match status {
        RuleStatus::Pass => Cell::new(status)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        RuleStatus::Fail => Cell::new(status)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn explanation_cell(result: &RuleResult) -> Cell {
    if result.is_pass() {
        dim_cell(result.explanation())
    } else {
        Cell::new(result.explanation()).fg(Color::Red)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

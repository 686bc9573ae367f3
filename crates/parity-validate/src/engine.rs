//! Validation engine: evaluates rule instances against a legacy (left) and a
//! migrated (right) dataset.
//!
//! Evaluation only reads the datasets. A rule that cannot be evaluated (a
//! missing column, a value that does not coerce to a number) becomes a failed
//! [`RuleResult`] carrying the error message; it never stops the rest of a
//! run.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, Column, DataFrame};
use tracing::{debug, info, info_span, warn};

use parity_common::{any_to_f64, any_to_string, is_missing_value};
use parity_model::{
    EvaluationError, ObservedValue, RuleInstance, RuleKind, RuleResult, RuleStatus, Side,
    ValidationRun,
};

use crate::aggregate;
use crate::catalog::effective_tolerance;

/// Explanation attached to every passing result.
pub const PASS_EXPLANATION: &str = "Validation passed";

/// Evaluate one rule against the two datasets.
///
/// # Errors
///
/// Returns [`EvaluationError::ColumnNotFound`] when the rule's column is absent
/// from either side and [`EvaluationError::TypeCoercion`] when a sum meets a
/// value that is not a number.
pub fn evaluate(
    rule: &RuleInstance,
    left: &DataFrame,
    right: &DataFrame,
) -> Result<RuleResult, EvaluationError> {
    let comparison = match rule.kind() {
        RuleKind::RowCount => Comparison::counts(left.height(), right.height()),
        RuleKind::SumColumn => {
            let column = required_column(rule)?;
            let left_sum = column_sum(left, column, Side::Left)?;
            let right_sum = column_sum(right, column, Side::Right)?;
            let tolerance = effective_tolerance(rule);
            let difference = (left_sum - right_sum).abs();
            let mut comparison = Comparison::new(
                ObservedValue::Sum(left_sum),
                ObservedValue::Sum(right_sum),
                difference <= tolerance,
            );
            if !comparison.passed {
                comparison.detail = Some(format!(
                    "difference {} exceeds tolerance {}",
                    ObservedValue::Sum(difference),
                    ObservedValue::Sum(tolerance)
                ));
            }
            comparison
        }
        RuleKind::DistinctCount => {
            let column = required_column(rule)?;
            let left_count = distinct_count(left, column, Side::Left)?;
            let right_count = distinct_count(right, column, Side::Right)?;
            Comparison::counts(left_count, right_count)
        }
        RuleKind::NotNull => {
            let column = required_column(rule)?;
            let left_missing = missing_count(left, column, Side::Left)?;
            let right_missing = missing_count(right, column, Side::Right)?;
            Comparison::new(
                ObservedValue::Count(left_missing as u64),
                ObservedValue::Count(right_missing as u64),
                left_missing == 0 && right_missing == 0,
            )
        }
        RuleKind::Uniqueness => {
            let column = required_column(rule)?;
            let left_duplicate = first_duplicate(left, column, Side::Left)?;
            let right_duplicate = first_duplicate(right, column, Side::Right)?;
            let mut comparison = Comparison::new(
                ObservedValue::Flag(left_duplicate.is_none()),
                ObservedValue::Flag(right_duplicate.is_none()),
                left_duplicate.is_none() && right_duplicate.is_none(),
            );
            comparison.detail = [(Side::Left, left_duplicate), (Side::Right, right_duplicate)]
                .into_iter()
                .filter_map(|(side, duplicate)| {
                    duplicate.map(|value| {
                        format!("duplicate {} in {side} dataset", describe(value.as_deref()))
                    })
                })
                .reduce(|a, b| format!("{a}; {b}"));
            comparison
        }
        RuleKind::RowHash => {
            let reference = rule.reference().ok_or(EvaluationError::DataFrame {
                message: "row hash rule has no reference dataset".to_string(),
            })?;
            let difference = first_difference(reference, right)?;
            let mut comparison = Comparison::new(
                ObservedValue::Count(reference.height() as u64),
                ObservedValue::Count(right.height() as u64),
                difference.is_none(),
            );
            comparison.detail =
                difference.map(|difference| format!("reference dataset differs: {difference}"));
            comparison
        }
    };

    Ok(comparison.into_result(rule))
}

/// Evaluate one rule, turning evaluation errors into a failed result.
pub fn evaluate_or_fail(rule: &RuleInstance, left: &DataFrame, right: &DataFrame) -> RuleResult {
    let span = info_span!("rule", rule = %rule);
    let _guard = span.enter();

    match evaluate(rule, left, right) {
        Ok(result) => {
            debug!(
                status = %result.status(),
                left = %result.left_value(),
                right = %result.right_value(),
                "rule evaluated"
            );
            result
        }
        Err(err) => {
            warn!(error = %err, "rule could not be evaluated");
            RuleResult::new(
                rule.rule_name(),
                rule.column().map(str::to_string),
                ObservedValue::Unavailable,
                ObservedValue::Unavailable,
                RuleStatus::Fail,
                err.to_string(),
            )
        }
    }
}

/// Evaluate every rule in configuration order.
pub fn run_all(rules: &[RuleInstance], left: &DataFrame, right: &DataFrame) -> ValidationRun {
    let span = info_span!("validation_run", rules = rules.len());
    let _guard = span.enter();

    let results = rules
        .iter()
        .map(|rule| evaluate_or_fail(rule, left, right))
        .collect();
    finish_run(results)
}

/// Evaluate rules on up to `workers` scoped threads.
///
/// Results come back in configuration order and are identical to
/// [`run_all`]; a worker count of 0 or 1 evaluates on the calling thread.
pub fn run_all_parallel(
    rules: &[RuleInstance],
    left: &DataFrame,
    right: &DataFrame,
    workers: usize,
) -> ValidationRun {
    let workers = workers.min(rules.len());
    if workers <= 1 {
        return run_all(rules, left, right);
    }

    let span = info_span!("validation_run", rules = rules.len(), workers);
    let _guard = span.enter();

    let chunk_size = rules.len().div_ceil(workers);
    let mut slots: Vec<Option<RuleResult>> = vec![None; rules.len()];
    std::thread::scope(|scope| {
        for (rule_chunk, slot_chunk) in rules.chunks(chunk_size).zip(slots.chunks_mut(chunk_size)) {
            let worker_span = span.clone();
            scope.spawn(move || {
                let _guard = worker_span.enter();
                for (rule, slot) in rule_chunk.iter().zip(slot_chunk.iter_mut()) {
                    *slot = Some(evaluate_or_fail(rule, left, right));
                }
            });
        }
    });

    finish_run(slots.into_iter().flatten().collect())
}

fn finish_run(results: Vec<RuleResult>) -> ValidationRun {
    let run = aggregate(results);
    info!(
        passed = run.pass_count(),
        failed = run.fail_count(),
        "validation run complete"
    );
    run
}

/// Observed values and verdict of one comparison, before naming.
struct Comparison {
    left: ObservedValue,
    right: ObservedValue,
    passed: bool,
    detail: Option<String>,
}

impl Comparison {
    fn new(left: ObservedValue, right: ObservedValue, passed: bool) -> Self {
        Self {
            left,
            right,
            passed,
            detail: None,
        }
    }

    fn counts(left: usize, right: usize) -> Self {
        Self::new(
            ObservedValue::Count(left as u64),
            ObservedValue::Count(right as u64),
            left == right,
        )
    }

    fn into_result(self, rule: &RuleInstance) -> RuleResult {
        let (status, explanation) = if self.passed {
            (RuleStatus::Pass, PASS_EXPLANATION.to_string())
        } else {
            let mut explanation =
                format!("Mismatch found: left={} vs right={}", self.left, self.right);
            if let Some(detail) = self.detail {
                explanation.push_str(" (");
                explanation.push_str(&detail);
                explanation.push(')');
            }
            (RuleStatus::Fail, explanation)
        };
        RuleResult::new(
            rule.rule_name(),
            rule.column().map(str::to_string),
            self.left,
            self.right,
            status,
            explanation,
        )
    }
}

fn required_column(rule: &RuleInstance) -> Result<&str, EvaluationError> {
    // RuleInstance construction guarantees a column for column-based kinds
    rule.column().ok_or_else(|| EvaluationError::DataFrame {
        message: format!("rule '{}' has no column", rule.kind()),
    })
}

fn lookup<'a>(df: &'a DataFrame, column: &str, side: Side) -> Result<&'a Column, EvaluationError> {
    df.column(column)
        .map_err(|_| EvaluationError::ColumnNotFound {
            column: column.to_string(),
            side,
        })
}

fn column_sum(df: &DataFrame, column: &str, side: Side) -> Result<f64, EvaluationError> {
    let series = lookup(df, column, side)?;
    let mut sum = 0.0;
    for idx in 0..series.len() {
        let value = series.get(idx)?;
        if is_missing_value(&value) {
            continue;
        }
        match any_to_f64(value.clone()) {
            Some(number) => sum += number,
            None => {
                return Err(EvaluationError::TypeCoercion {
                    column: column.to_string(),
                    side,
                    value: any_to_string(value),
                });
            }
        }
    }
    Ok(sum)
}

fn distinct_count(df: &DataFrame, column: &str, side: Side) -> Result<usize, EvaluationError> {
    let series = lookup(df, column, side)?;
    let mut seen = BTreeSet::new();
    for idx in 0..series.len() {
        let value = series.get(idx)?;
        if !is_missing_value(&value) {
            seen.insert(cell_key(value));
        }
    }
    Ok(seen.len())
}

fn missing_count(df: &DataFrame, column: &str, side: Side) -> Result<usize, EvaluationError> {
    let series = lookup(df, column, side)?;
    let mut missing = 0;
    for idx in 0..series.len() {
        if is_missing_value(&series.get(idx)?) {
            missing += 1;
        }
    }
    Ok(missing)
}

/// First repeated key of a column; missing cells share one key.
fn first_duplicate(
    df: &DataFrame,
    column: &str,
    side: Side,
) -> Result<Option<Option<String>>, EvaluationError> {
    let series = lookup(df, column, side)?;
    let mut seen = BTreeSet::new();
    for idx in 0..series.len() {
        let value = series.get(idx)?;
        let key = (!is_missing_value(&value)).then(|| cell_key(value));
        if !seen.insert(key.clone()) {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

fn cell_key(value: AnyValue<'_>) -> String {
    any_to_string(value).trim().to_string()
}

fn describe(key: Option<&str>) -> String {
    match key {
        Some(value) => format!("value '{value}'"),
        None => "missing value".to_string(),
    }
}

/// First structural difference between two datasets, if any.
///
/// Compares column names and order, dtypes, height and then every cell, with
/// null equal to null.
fn first_difference(
    reference: &DataFrame,
    right: &DataFrame,
) -> Result<Option<String>, EvaluationError> {
    let reference_names: Vec<&str> = reference
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    let right_names: Vec<&str> = right
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    if reference_names != right_names {
        return Ok(Some(format!(
            "columns [{}] vs [{}]",
            reference_names.join(", "),
            right_names.join(", ")
        )));
    }

    for (expected, actual) in reference.get_columns().iter().zip(right.get_columns()) {
        if expected.dtype() != actual.dtype() {
            return Ok(Some(format!(
                "column '{}' has type {} vs {}",
                expected.name(),
                expected.dtype(),
                actual.dtype()
            )));
        }
    }

    if reference.height() != right.height() {
        return Ok(Some(format!(
            "row count {} vs {}",
            reference.height(),
            right.height()
        )));
    }

    for (expected, actual) in reference.get_columns().iter().zip(right.get_columns()) {
        for idx in 0..expected.len() {
            let expected_value = expected.get(idx)?;
            let actual_value = actual.get(idx)?;
            if !cells_equal(&expected_value, &actual_value) {
                return Ok(Some(format!(
                    "row {idx}, column '{}': '{}' vs '{}'",
                    expected.name(),
                    any_to_string(expected_value),
                    any_to_string(actual_value)
                )));
            }
        }
    }

    Ok(None)
}

fn cells_equal(expected: &AnyValue<'_>, actual: &AnyValue<'_>) -> bool {
    match (expected, actual) {
        (AnyValue::Null, AnyValue::Null) => true,
        (AnyValue::Null, _) | (_, AnyValue::Null) => false,
        _ => any_to_string(expected.clone()) == any_to_string(actual.clone()),
    }
}

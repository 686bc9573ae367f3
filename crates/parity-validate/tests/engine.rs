//! End-to-end rule runs over legacy and migrated datasets.

use std::io::Write;
use std::path::Path;

use polars::prelude::{Column, DataFrame};
use tempfile::NamedTempFile;

use parity_ingest::{DatasetBuilder, LoadOptions, RawValue, read_csv_dataset};
use parity_model::{ObservedValue, RuleInstance, RuleKind, RuleStatus};
use parity_validate::{
    PASS_EXPLANATION, RuleStore, evaluate, evaluate_or_fail, run_all, run_all_parallel,
};

/// 100 rows of `amount`, all 50.0 except a final `last` value.
fn amounts(last: f64) -> DataFrame {
    let mut values = vec![50.0_f64; 99];
    values.push(last);
    DataFrame::new(vec![Column::new("amount".into(), values)]).expect("amount frame")
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{content}").expect("write csv");
    file
}

fn load(path: &Path) -> DataFrame {
    read_csv_dataset(path, &LoadOptions::default()).expect("load csv")
}

#[test]
fn sum_within_tolerance_passes() {
    let left = amounts(50.0);
    let right = amounts(50.005);

    let rule = RuleInstance::sum("amount").expect("rule");
    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Pass);
    assert_eq!(result.explanation(), PASS_EXPLANATION);
    assert_eq!(result.left_value(), ObservedValue::Sum(5000.0));
}

#[test]
fn sum_beyond_tolerance_cites_both_sums() {
    let left = amounts(50.0);
    let right = amounts(50.02);

    let rule = RuleInstance::sum("amount").expect("rule");
    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Fail);
    assert!(
        result
            .explanation()
            .starts_with("Mismatch found: left=5000 vs right=5000.02"),
        "unexpected explanation: {}",
        result.explanation()
    );
}

#[test]
fn not_null_reports_both_counts() {
    let left = DatasetBuilder::new()
        .column("email", ["a@x.com", "b@x.com", "c@x.com"])
        .build()
        .expect("left");
    let clean = left.clone();
    let right = DatasetBuilder::new()
        .column(
            "email",
            [
                RawValue::from("a@x.com"),
                RawValue::from(None::<&str>),
                RawValue::Bytes(b"        ".to_vec()),
            ],
        )
        .build()
        .expect("right");

    let rule = RuleInstance::not_null("email").expect("rule");
    assert!(evaluate(&rule, &left, &clean).expect("evaluate").is_pass());

    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Fail);
    assert_eq!(result.explanation(), "Mismatch found: left=0 vs right=2");
}

#[test]
fn equal_non_zero_null_counts_still_fail() {
    let emails = [
        Some("a@x.com"),
        None,
        Some("b@x.com"),
        None,
        Some("   "),
    ];
    let left = DatasetBuilder::new()
        .column("email", emails)
        .build()
        .expect("left");
    let right = left.clone();

    let rule = RuleInstance::not_null("email").expect("rule");
    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Fail);
    assert_eq!(result.left_value(), ObservedValue::Count(3));
    assert_eq!(result.right_value(), ObservedValue::Count(3));
    assert_eq!(result.explanation(), "Mismatch found: left=3 vs right=3");
}

/// `id,amount` export with integer amounts for `rows` rows, then `last`.
fn late_value_csv(rows: usize, last: &str) -> NamedTempFile {
    let mut content = String::from("id,amount\n");
    for id in 0..rows {
        content.push_str(&format!("{id},{id}\n"));
    }
    content.push_str(&format!("{rows},{last}\n"));
    write_csv(&content)
}

#[test]
fn late_non_numeric_value_fails_only_its_rule() {
    let legacy = late_value_csv(150, "n/a");
    let migrated = late_value_csv(150, "0");
    let left = load(legacy.path());
    let right = load(migrated.path());

    let rules = vec![
        RuleInstance::row_count(),
        RuleInstance::sum("amount").expect("rule"),
        RuleInstance::distinct_count("id").expect("rule"),
    ];
    let run = run_all(&rules, &left, &right);

    assert_eq!(run.pass_count(), 2);
    let sum = &run.results()[1];
    assert_eq!(sum.status(), RuleStatus::Fail);
    assert_eq!(sum.left_value(), ObservedValue::Unavailable);
    assert!(sum.explanation().contains("left dataset"));
    assert!(sum.explanation().contains("'n/a'"));
}

#[test]
fn late_float_value_widens_the_column() {
    let legacy = late_value_csv(150, "2.5");
    let migrated = late_value_csv(150, "2.5");
    let left = load(legacy.path());
    let right = load(migrated.path());

    let rule = RuleInstance::sum("amount").expect("rule");
    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert!(result.is_pass());
    // 0 + 1 + ... + 149
    assert_eq!(result.left_value(), ObservedValue::Sum(11_177.5));
}

#[test]
fn nan_cells_are_missing_values() {
    let export = write_csv("amount\n1.0\nNaN\n2.0\n");
    let df = load(export.path());

    let sum = RuleInstance::sum("amount").expect("rule");
    let result = evaluate(&sum, &df, &df).expect("evaluate");
    assert!(result.is_pass());
    assert_eq!(result.left_value(), ObservedValue::Sum(3.0));

    let not_null = RuleInstance::not_null("amount").expect("rule");
    let result = evaluate(&not_null, &df, &df).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Fail);
    assert_eq!(result.explanation(), "Mismatch found: left=1 vs right=1");
}

#[test]
fn uniqueness_fails_when_only_one_side_is_unique() {
    let left = DataFrame::new(vec![Column::new("cust_id".into(), [1_i64, 2, 3])]).expect("left");
    let right = DataFrame::new(vec![Column::new("cust_id".into(), [1_i64, 1, 3])]).expect("right");
    let rule = RuleInstance::uniqueness("cust_id").expect("rule");
    let result = evaluate(&rule, &left, &right).expect("evaluate");
    assert_eq!(result.status(), RuleStatus::Fail);
    assert_eq!(result.left_value(), ObservedValue::Flag(true));
    assert_eq!(result.right_value(), ObservedValue::Flag(false));
}

#[test]
fn missing_column_does_not_stop_the_run() {
    let legacy = write_csv("cust_id,ssn,amount\n1,111,10.5\n2,222,20\n");
    let migrated = write_csv("CUST_ID,AMOUNT\n1,10.5\n2,20.0\n");
    let left = load(legacy.path());
    let right = load(migrated.path());

    let mut store = RuleStore::new();
    store.add(RuleInstance::row_count());
    store
        .add_rule(RuleKind::NotNull, Some("SSN"), None)
        .expect("not null rule");
    store.add(RuleInstance::sum("amount").expect("rule"));

    let run = run_all(store.as_slice(), &left, &right);
    assert_eq!(run.total(), 3);
    assert_eq!(run.pass_count(), 2);
    assert_eq!(run.fail_count(), 1);

    let failed = &run.results()[1];
    assert_eq!(failed.column(), Some("ssn"));
    assert_eq!(failed.status(), RuleStatus::Fail);
    assert_eq!(failed.explanation(), "column 'ssn' not found in right dataset");
    assert!(run.results()[2].is_pass());
}

#[test]
fn coercion_failure_names_column_and_value() {
    let left = DataFrame::new(vec![Column::new("amount".into(), [1.0_f64, 2.0])]).expect("left");
    let right =
        DataFrame::new(vec![Column::new("amount".into(), ["1.0", "two"])]).expect("right");

    let result = evaluate_or_fail(&RuleInstance::sum("amount").expect("rule"), &left, &right);
    assert_eq!(result.status(), RuleStatus::Fail);
    assert!(result.explanation().contains("'amount'"));
    assert!(result.explanation().contains("right dataset"));
    assert!(result.explanation().contains("'two'"));
}

#[test]
fn transaction_templates_run_against_csv_exports() {
    let legacy = write_csv(
        "tran_id,cust_id,amount\n1,A,100.25\n2,B,50.5\n3,A,10\n",
    );
    let migrated = write_csv(
        "tran_id,cust_id,amount\n1,A,100.25\n2,B,50.5\n3,C,10.0005\n",
    );
    let left = load(legacy.path());
    let right = load(migrated.path());

    let mut store = RuleStore::new();
    store
        .extend_from_templates("transaction")
        .expect("templates");
    let run = run_all(store.as_slice(), &left, &right);

    let statuses: Vec<(&str, RuleStatus)> = run
        .results()
        .iter()
        .map(|result| (result.rule_name(), result.status()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("row_count", RuleStatus::Pass),
            ("sum_amount", RuleStatus::Pass),
            ("distinct_cust", RuleStatus::Fail),
        ]
    );
    assert_eq!(
        run.results()[2].explanation(),
        "Mismatch found: left=2 vs right=3"
    );
}

#[test]
fn row_hash_compares_reference_file_with_migrated() {
    let migrated = write_csv("id,name\n1,Alice\n2,Bob\n");
    let reference = write_csv("id,name\n1,Alice\n2,Bob\n");
    let stale = write_csv("id,name\n1,Alice\n2,Rob\n");
    let right = load(migrated.path());

    let mut store = RuleStore::new();
    store
        .add_rule(RuleKind::RowHash, None, Some(load(reference.path())))
        .expect("row hash");
    store
        .add_rule(RuleKind::RowHash, None, Some(load(stale.path())))
        .expect("row hash");

    let run = run_all(store.as_slice(), &DataFrame::empty(), &right);
    assert!(run.results()[0].is_pass());
    assert!(!run.results()[1].is_pass());
    assert!(
        run.results()[1]
            .explanation()
            .contains("row 1, column 'name': 'Rob' vs 'Bob'")
    );
}

#[test]
fn parallel_run_keeps_configuration_order() {
    let left = DataFrame::new(vec![
        Column::new("id".into(), [1_i64, 2, 3]),
        Column::new("name".into(), ["a", "b", "c"]),
    ])
    .expect("left");
    let right = DataFrame::new(vec![
        Column::new("id".into(), [1_i64, 2, 2]),
        Column::new("name".into(), ["a", "b", "b"]),
    ])
    .expect("right");

    let rules = vec![
        RuleInstance::row_count(),
        RuleInstance::uniqueness("id").expect("rule"),
        RuleInstance::distinct_count("name").expect("rule"),
        RuleInstance::not_null("missing").expect("rule"),
        RuleInstance::sum("id").expect("rule"),
    ];
    let sequential = run_all(&rules, &left, &right);
    for workers in 0..=6 {
        assert_eq!(run_all_parallel(&rules, &left, &right, workers), sequential);
    }
}

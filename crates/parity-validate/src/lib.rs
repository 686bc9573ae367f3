//! Migration parity validation.
//!
//! The [`catalog`] knows which columns suit each rule kind and which tests ship
//! for known tables, the [`RuleStore`] holds the configured rules, and the
//! [`engine`] evaluates them against a legacy and a migrated dataset.

pub mod catalog;
pub mod engine;
mod report;
mod store;

pub use catalog::{
    ColumnMapping, SUM_TOLERANCE, TABLE_MAPPINGS, TableMapping, TemplateTest, default_column,
    effective_tolerance, known_tables, suggest_columns, table_mapping, template_rules,
    template_tests, tolerance,
};
pub use engine::{PASS_EXPLANATION, evaluate, evaluate_or_fail, run_all, run_all_parallel};
pub use report::{RunReportPayload, write_run_report_json};
pub use store::RuleStore;

use parity_model::{RuleResult, ValidationRun};

/// Summarise rule results into a run, keeping their order.
///
/// `pass_count + fail_count` always equals the number of results.
pub fn aggregate(results: Vec<RuleResult>) -> ValidationRun {
    ValidationRun::from_results(results)
}

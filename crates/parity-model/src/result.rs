//! Rule outcomes and run summaries.

use std::fmt;

use parity_common::format_numeric;
use serde::{Deserialize, Serialize};

/// Verdict of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleStatus {
    Pass,
    Fail,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Pass => "PASS",
            RuleStatus::Fail => "FAIL",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, RuleStatus::Pass)
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value observed on one side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservedValue {
    /// Row, distinct-value or null counts.
    Count(u64),
    /// Column sums.
    Sum(f64),
    /// Uniqueness verdicts.
    Flag(bool),
    /// No value could be computed (the rule failed before comparing).
    Unavailable,
}

impl fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedValue::Count(count) => write!(f, "{count}"),
            ObservedValue::Sum(sum) => f.write_str(&format_numeric(*sum)),
            ObservedValue::Flag(flag) => write!(f, "{flag}"),
            ObservedValue::Unavailable => f.write_str("-"),
        }
    }
}

/// Outcome of evaluating one rule instance. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    rule_name: String,
    column: Option<String>,
    left_value: ObservedValue,
    right_value: ObservedValue,
    status: RuleStatus,
    explanation: String,
}

impl RuleResult {
    pub fn new(
        rule_name: impl Into<String>,
        column: Option<String>,
        left_value: ObservedValue,
        right_value: ObservedValue,
        status: RuleStatus,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            column,
            left_value,
            right_value,
            status,
            explanation: explanation.into(),
        }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn left_value(&self) -> ObservedValue {
        self.left_value
    }

    pub fn right_value(&self) -> ObservedValue {
        self.right_value
    }

    pub fn status(&self) -> RuleStatus {
        self.status
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }
}

/// Ordered results of one run plus pass/fail counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRun {
    pass_count: usize,
    fail_count: usize,
    results: Vec<RuleResult>,
}

impl ValidationRun {
    /// Summarise results, keeping their order.
    pub fn from_results(results: Vec<RuleResult>) -> Self {
        let pass_count = results.iter().filter(|result| result.is_pass()).count();
        let fail_count = results.len() - pass_count;
        Self {
            pass_count,
            fail_count,
            results,
        }
    }

    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    pub fn fail_count(&self) -> usize {
        self.fail_count
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[RuleResult] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|result| !result.is_pass())
    }

    pub fn all_passed(&self) -> bool {
        self.fail_count == 0
    }

    pub fn into_results(self) -> Vec<RuleResult> {
        self.results
    }
}

//! Rule kinds and configured rule instances.

use std::fmt;
use std::str::FromStr;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The fixed set of comparisons the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Row counts of both datasets must match.
    RowCount,
    /// Column sums must match within a tolerance.
    SumColumn,
    /// Distinct value counts of a column must match.
    DistinctCount,
    /// A column must contain no missing values on either side.
    NotNull,
    /// A column must contain no duplicate values on either side.
    Uniqueness,
    /// A reference dataset must equal the migrated dataset exactly.
    RowHash,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::RowCount,
        RuleKind::SumColumn,
        RuleKind::DistinctCount,
        RuleKind::NotNull,
        RuleKind::Uniqueness,
        RuleKind::RowHash,
    ];

    /// Display label used in result tables.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::RowCount => "Row Count",
            RuleKind::SumColumn => "Sum",
            RuleKind::DistinctCount => "Distinct Count",
            RuleKind::NotNull => "Not Null",
            RuleKind::Uniqueness => "Uniqueness",
            RuleKind::RowHash => "Row Hash",
        }
    }

    /// Snake-case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::RowCount => "row_count",
            RuleKind::SumColumn => "sum_column",
            RuleKind::DistinctCount => "distinct_count",
            RuleKind::NotNull => "not_null",
            RuleKind::Uniqueness => "uniqueness",
            RuleKind::RowHash => "row_hash",
        }
    }

    /// Whether instances of this kind must name a target column.
    pub fn requires_column(&self) -> bool {
        matches!(
            self,
            RuleKind::SumColumn | RuleKind::DistinctCount | RuleKind::NotNull | RuleKind::Uniqueness
        )
    }

    /// Whether instances of this kind must carry a reference dataset.
    pub fn requires_reference(&self) -> bool {
        matches!(self, RuleKind::RowHash)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RuleKind {
    type Err = ConfigError;

    /// Parse a rule name.
    ///
    /// Accepts display labels ("Row Count", "Sum Amount") and snake-case names
    /// ("row_count", "sum_amount"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .split(|ch: char| ch.is_whitespace() || ch == '-' || ch == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");

        match normalized.as_str() {
            "row_count" => Ok(RuleKind::RowCount),
            "sum" | "sum_amount" | "sum_column" => Ok(RuleKind::SumColumn),
            "distinct" | "distinct_count" => Ok(RuleKind::DistinctCount),
            "not_null" => Ok(RuleKind::NotNull),
            "unique" | "uniqueness" => Ok(RuleKind::Uniqueness),
            "row_hash" => Ok(RuleKind::RowHash),
            _ => Err(ConfigError::UnknownRule {
                name: s.to_string(),
                expected: RuleKind::ALL
                    .iter()
                    .map(RuleKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// A configured application of a rule kind to a column.
///
/// Fields are private so that every instance satisfies its kind's
/// configuration requirements: column-based kinds always have a column and row
/// hash rules always have a reference dataset.
#[derive(Debug, Clone)]
pub struct RuleInstance {
    kind: RuleKind,
    column: Option<String>,
    reference: Option<DataFrame>,
    tolerance: Option<f64>,
    name: Option<String>,
    sql: Option<String>,
}

impl RuleInstance {
    /// Build a rule instance, rejecting configurations its kind cannot run.
    ///
    /// Column names are lower-cased to match loaded datasets. A reference
    /// dataset passed to a kind other than [`RuleKind::RowHash`] is ignored.
    pub fn new(
        kind: RuleKind,
        column: Option<&str>,
        reference: Option<DataFrame>,
    ) -> Result<Self, ConfigError> {
        let column = column
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty());

        match (&column, kind.requires_column()) {
            (None, true) => return Err(ConfigError::MissingColumn { kind }),
            (Some(column), false) => {
                return Err(ConfigError::UnexpectedColumn {
                    kind,
                    column: column.clone(),
                });
            }
            _ => {}
        }

        let reference = if kind.requires_reference() {
            Some(reference.ok_or(ConfigError::MissingReference { kind })?)
        } else {
            None
        };

        Ok(Self::unchecked(kind, column, reference))
    }

    pub fn row_count() -> Self {
        Self::unchecked(RuleKind::RowCount, None, None)
    }

    /// Sum comparison on `column`; rejects a blank column name.
    pub fn sum(column: &str) -> Result<Self, ConfigError> {
        Self::new(RuleKind::SumColumn, Some(column), None)
    }

    pub fn distinct_count(column: &str) -> Result<Self, ConfigError> {
        Self::new(RuleKind::DistinctCount, Some(column), None)
    }

    pub fn not_null(column: &str) -> Result<Self, ConfigError> {
        Self::new(RuleKind::NotNull, Some(column), None)
    }

    pub fn uniqueness(column: &str) -> Result<Self, ConfigError> {
        Self::new(RuleKind::Uniqueness, Some(column), None)
    }

    pub fn row_hash(reference: DataFrame) -> Self {
        Self::unchecked(RuleKind::RowHash, None, Some(reference))
    }

    fn unchecked(kind: RuleKind, column: Option<String>, reference: Option<DataFrame>) -> Self {
        Self {
            kind,
            column,
            reference,
            tolerance: None,
            name: None,
            sql: None,
        }
    }

    /// Override the catalog tolerance for this instance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance { value: tolerance });
        }
        self.tolerance = Some(tolerance);
        Ok(self)
    }

    /// Name reported in results instead of the kind's label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach the SQL text this rule stands for (a label only, never executed).
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn reference(&self) -> Option<&DataFrame> {
        self.reference.as_ref()
    }

    pub fn tolerance_override(&self) -> Option<f64> {
        self.tolerance
    }

    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Name reported in results.
    pub fn rule_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.label())
    }
}

impl fmt::Display for RuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.column, &self.reference) {
            (Some(column), _) => write!(f, "{} ({column})", self.rule_name()),
            (None, Some(reference)) => write!(
                f,
                "{} (reference: {} rows)",
                self.rule_name(),
                reference.height()
            ),
            (None, None) => f.write_str(self.rule_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_names() {
        assert_eq!("Row Count".parse::<RuleKind>().unwrap(), RuleKind::RowCount);
        assert_eq!("sum_amount".parse::<RuleKind>().unwrap(), RuleKind::SumColumn);
        assert_eq!("Sum Amount".parse::<RuleKind>().unwrap(), RuleKind::SumColumn);
        assert_eq!(
            "DISTINCT COUNT".parse::<RuleKind>().unwrap(),
            RuleKind::DistinctCount
        );
        assert_eq!("not-null".parse::<RuleKind>().unwrap(), RuleKind::NotNull);
        assert_eq!(" uniqueness ".parse::<RuleKind>().unwrap(), RuleKind::Uniqueness);
        assert_eq!("Row Hash".parse::<RuleKind>().unwrap(), RuleKind::RowHash);
    }

    #[test]
    fn unknown_rule_lists_known_names() {
        let err = "median".parse::<RuleKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("median"));
        assert!(message.contains("row_count"));
        assert!(message.contains("row_hash"));
    }

    #[test]
    fn kind_round_trips_through_as_str() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.as_str().parse::<RuleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn new_lowercases_column() {
        let rule = RuleInstance::new(RuleKind::SumColumn, Some(" Amount "), None).unwrap();
        assert_eq!(rule.column(), Some("amount"));
        assert_eq!(rule.rule_name(), "Sum");
        assert_eq!(rule.to_string(), "Sum (amount)");
    }

    #[test]
    fn new_rejects_missing_column() {
        let err = RuleInstance::new(RuleKind::NotNull, None, None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingColumn {
                kind: RuleKind::NotNull
            }
        );
        let err = RuleInstance::new(RuleKind::Uniqueness, Some("  "), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingColumn { .. }));
    }

    #[test]
    fn new_rejects_row_hash_without_reference() {
        let err = RuleInstance::new(RuleKind::RowHash, None, None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingReference {
                kind: RuleKind::RowHash
            }
        );
    }

    #[test]
    fn new_rejects_column_on_row_count() {
        let err = RuleInstance::new(RuleKind::RowCount, Some("id"), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedColumn { .. }));
    }

    #[test]
    fn column_constructors_reject_blank_names() {
        assert_eq!(
            RuleInstance::sum("").unwrap_err(),
            ConfigError::MissingColumn {
                kind: RuleKind::SumColumn
            }
        );
        assert!(RuleInstance::not_null("  ").is_err());
        assert!(RuleInstance::distinct_count("\t").is_err());
        assert!(RuleInstance::uniqueness("").is_err());
        assert_eq!(RuleInstance::uniqueness(" ID ").unwrap().column(), Some("id"));
    }

    #[test]
    fn tolerance_override_must_be_non_negative() {
        assert!(RuleInstance::sum("amount").unwrap().with_tolerance(-0.1).is_err());
        assert!(RuleInstance::sum("amount").unwrap().with_tolerance(f64::NAN).is_err());
        let rule = RuleInstance::sum("amount").unwrap().with_tolerance(0.001).unwrap();
        assert_eq!(rule.tolerance_override(), Some(0.001));
    }

    #[test]
    fn name_overrides_label() {
        let rule = RuleInstance::row_count()
            .with_name("row_count")
            .with_sql("SELECT COUNT(*) FROM landing.customer");
        assert_eq!(rule.rule_name(), "row_count");
        assert_eq!(rule.sql(), Some("SELECT COUNT(*) FROM landing.customer"));
    }

    #[test]
    fn row_hash_keeps_reference() {
        let rule = RuleInstance::row_hash(DataFrame::empty());
        assert!(rule.reference().is_some());
        assert_eq!(rule.to_string(), "Row Hash (reference: 0 rows)");
    }
}

//! Rule catalog: column suggestions, tolerances and canned table tests.
//!
//! Suggestions are a convenience for whoever assembles a rule list; nothing
//! here affects whether a rule passes.

use polars::prelude::DataFrame;

use parity_common::{is_numeric_dtype, is_text_dtype};
use parity_model::{ConfigError, RuleInstance, RuleKind};

/// Absolute tolerance for sum comparisons.
///
/// Two engines summing the same column accumulate floating-point error
/// differently; differences up to this value still pass.
pub const SUM_TOLERANCE: f64 = 0.01;

/// Tolerance used when a rule instance does not override it.
pub fn tolerance(kind: RuleKind) -> f64 {
    match kind {
        RuleKind::SumColumn => SUM_TOLERANCE,
        RuleKind::RowCount
        | RuleKind::DistinctCount
        | RuleKind::NotNull
        | RuleKind::Uniqueness
        | RuleKind::RowHash => 0.0,
    }
}

/// Tolerance in effect for a rule instance.
pub fn effective_tolerance(rule: &RuleInstance) -> f64 {
    rule.tolerance_override()
        .unwrap_or_else(|| tolerance(rule.kind()))
}

/// Candidate columns for a rule kind, in dataset column order.
///
/// - Sum: first 3 numeric columns
/// - Distinct count: first 3 text columns
/// - Not null: first 5 columns of any type
/// - Uniqueness: up to 2 text columns followed by 1 numeric column
/// - Row count / row hash: none
pub fn suggest_columns(kind: RuleKind, dataset: &DataFrame) -> Vec<String> {
    let numeric = || columns_where(dataset, |column| is_numeric_dtype(column.dtype()));
    let text = || columns_where(dataset, |column| is_text_dtype(column.dtype()));

    match kind {
        RuleKind::SumColumn => numeric().take(3).collect(),
        RuleKind::DistinctCount => text().take(3).collect(),
        RuleKind::NotNull => dataset
            .get_column_names()
            .iter()
            .take(5)
            .map(|name| name.to_string())
            .collect(),
        RuleKind::Uniqueness => text().take(2).chain(numeric().take(1)).collect(),
        RuleKind::RowCount | RuleKind::RowHash => Vec::new(),
    }
}

/// Column to preselect when configuring a rule.
///
/// The first suggestion, or the dataset's first column when there is none.
/// Returns `None` for kinds that take no column and for empty datasets.
pub fn default_column(kind: RuleKind, dataset: &DataFrame) -> Option<String> {
    if !kind.requires_column() {
        return None;
    }
    suggest_columns(kind, dataset).into_iter().next().or_else(|| {
        dataset
            .get_column_names()
            .first()
            .map(|name| name.to_string())
    })
}

fn columns_where<'a>(
    dataset: &'a DataFrame,
    predicate: impl Fn(&polars::prelude::Column) -> bool + 'a,
) -> impl Iterator<Item = String> + 'a {
    dataset
        .get_columns()
        .iter()
        .filter(move |column| predicate(column))
        .map(|column| column.name().to_string())
}

/// Source-to-target column mapping for a migrated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: &'static str,
    pub target: &'static str,
    pub transform: Option<&'static str>,
    pub pii: bool,
    pub masking: Option<&'static str>,
}

/// Legacy and migrated table names for a known table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMapping {
    pub name: &'static str,
    pub source_table: &'static str,
    pub target_table: &'static str,
    pub columns: &'static [ColumnMapping],
}

const fn mapped(source: &'static str) -> ColumnMapping {
    ColumnMapping {
        source,
        target: source,
        transform: None,
        pii: false,
        masking: None,
    }
}

const fn transformed(source: &'static str, transform: &'static str) -> ColumnMapping {
    ColumnMapping {
        transform: Some(transform),
        ..mapped(source)
    }
}

const CUSTOMER_COLUMNS: &[ColumnMapping] = &[
    transformed("cust_id", "CAST"),
    mapped("first_name"),
    mapped("last_name"),
    ColumnMapping {
        pii: true,
        masking: Some("hash_email"),
        ..mapped("email")
    },
    transformed("birth_dt", "SAS_DATE_TO_DATE"),
    transformed("is_active", "0/1 to BOOLEAN"),
];

const TRANSACTION_COLUMNS: &[ColumnMapping] = &[
    mapped("tran_id"),
    mapped("cust_id"),
    transformed("tran_dt", "SAS_DATETIME_TO_TIMESTAMP"),
    mapped("amount"),
    mapped("currency"),
    mapped("product_id"),
];

/// Tables with canned validation tests.
pub const TABLE_MAPPINGS: &[TableMapping] = &[
    TableMapping {
        name: "customer",
        source_table: "saslib.customer",
        target_table: "landing.customer",
        columns: CUSTOMER_COLUMNS,
    },
    TableMapping {
        name: "transaction",
        source_table: "saslib.transaction",
        target_table: "landing.transaction",
        columns: TRANSACTION_COLUMNS,
    },
];

/// Look up a table mapping by name (case-insensitive).
pub fn table_mapping(table: &str) -> Option<&'static TableMapping> {
    TABLE_MAPPINGS
        .iter()
        .find(|mapping| mapping.name.eq_ignore_ascii_case(table.trim()))
}

/// Names of all tables with canned tests.
pub fn known_tables() -> Vec<&'static str> {
    TABLE_MAPPINGS.iter().map(|mapping| mapping.name).collect()
}

/// A named check with the SQL it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateTest {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: RuleKind,
    pub column: Option<&'static str>,
    pub tolerance: f64,
}

const ROW_COUNT: TemplateTest = TemplateTest {
    name: "row_count",
    description: "Row counts should match",
    kind: RuleKind::RowCount,
    column: None,
    tolerance: 0.0,
};

const NULL_EMAIL: TemplateTest = TemplateTest {
    name: "null_email",
    description: "No null emails allowed",
    kind: RuleKind::NotNull,
    column: Some("email"),
    tolerance: 0.0,
};

const SUM_AMOUNT: TemplateTest = TemplateTest {
    name: "sum_amount",
    description: "SUM(amount) should match within tolerance",
    kind: RuleKind::SumColumn,
    column: Some("amount"),
    tolerance: 0.001,
};

const DISTINCT_CUST: TemplateTest = TemplateTest {
    name: "distinct_cust",
    description: "Distinct customers should match",
    kind: RuleKind::DistinctCount,
    column: Some("cust_id"),
    tolerance: 0.0,
};

impl TemplateTest {
    /// SQL label for this test against a migrated table.
    pub fn sql(&self, target_table: &str) -> String {
        let column = self.column.unwrap_or("*");
        match self.kind {
            RuleKind::RowCount => format!("SELECT COUNT(*) FROM {target_table}"),
            RuleKind::SumColumn => format!("SELECT SUM({column}) FROM {target_table}"),
            RuleKind::DistinctCount => {
                format!("SELECT COUNT(DISTINCT {column}) FROM {target_table}")
            }
            RuleKind::NotNull => {
                format!("SELECT COUNT(*) FROM {target_table} WHERE {column} IS NULL")
            }
            RuleKind::Uniqueness => format!(
                "SELECT {column}, COUNT(*) FROM {target_table} GROUP BY {column} HAVING COUNT(*) > 1"
            ),
            RuleKind::RowHash => format!("SELECT * FROM {target_table}"),
        }
    }

    /// Rule instance carrying this test's name, SQL label and tolerance.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] of a test its kind cannot run, such as a
    /// row hash test (templates carry no reference dataset).
    pub fn to_rule(&self, target_table: &str) -> Result<RuleInstance, ConfigError> {
        RuleInstance::new(self.kind, self.column, None)?
            .with_name(self.name)
            .with_sql(self.sql(target_table))
            .with_tolerance(self.tolerance)
    }
}

/// Canned tests for a table; empty for unknown tables.
pub fn template_tests(table: &str) -> Vec<TemplateTest> {
    match table_mapping(table).map(|mapping| mapping.name) {
        Some("customer") => vec![ROW_COUNT, NULL_EMAIL],
        Some("transaction") => vec![ROW_COUNT, SUM_AMOUNT, DISTINCT_CUST],
        _ => Vec::new(),
    }
}

/// Canned tests for a table as rule instances; empty for unknown tables.
pub fn template_rules(table: &str) -> Result<Vec<RuleInstance>, ConfigError> {
    let Some(mapping) = table_mapping(table) else {
        return Ok(Vec::new());
    };
    template_tests(table)
        .iter()
        .map(|test| test.to_rule(mapping.target_table))
        .collect()
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, DataFrame};

    use super::*;

    fn mixed_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("cust_id".into(), [1_i64, 2]),
            Column::new("first_name".into(), ["a", "b"]),
            Column::new("last_name".into(), ["c", "d"]),
            Column::new("email".into(), ["e", "f"]),
            Column::new("balance".into(), [1.0_f64, 2.0]),
            Column::new("score".into(), [3_i64, 4]),
            Column::new("limit".into(), [5_i64, 6]),
            Column::new("city".into(), ["g", "h"]),
        ])
        .unwrap()
    }

    #[test]
    fn sum_prefers_first_three_numeric() {
        let df = mixed_frame();
        assert_eq!(
            suggest_columns(RuleKind::SumColumn, &df),
            vec!["cust_id", "balance", "score"]
        );
    }

    #[test]
    fn distinct_prefers_first_three_text() {
        let df = mixed_frame();
        assert_eq!(
            suggest_columns(RuleKind::DistinctCount, &df),
            vec!["first_name", "last_name", "email"]
        );
    }

    #[test]
    fn not_null_takes_first_five() {
        let df = mixed_frame();
        assert_eq!(
            suggest_columns(RuleKind::NotNull, &df),
            vec!["cust_id", "first_name", "last_name", "email", "balance"]
        );
    }

    #[test]
    fn uniqueness_mixes_text_and_numeric() {
        let df = mixed_frame();
        assert_eq!(
            suggest_columns(RuleKind::Uniqueness, &df),
            vec!["first_name", "last_name", "cust_id"]
        );
    }

    #[test]
    fn whole_dataset_kinds_have_no_suggestions() {
        let df = mixed_frame();
        assert!(suggest_columns(RuleKind::RowCount, &df).is_empty());
        assert!(suggest_columns(RuleKind::RowHash, &df).is_empty());
        assert_eq!(default_column(RuleKind::RowCount, &df), None);
    }

    #[test]
    fn default_column_falls_back_to_first_column() {
        let df = DataFrame::new(vec![Column::new("name".into(), ["a"])]).unwrap();
        assert!(suggest_columns(RuleKind::SumColumn, &df).is_empty());
        assert_eq!(
            default_column(RuleKind::SumColumn, &df),
            Some("name".to_string())
        );
        assert_eq!(default_column(RuleKind::SumColumn, &DataFrame::empty()), None);
    }

    #[test]
    fn tolerances() {
        assert_eq!(tolerance(RuleKind::SumColumn), SUM_TOLERANCE);
        for kind in [
            RuleKind::RowCount,
            RuleKind::DistinctCount,
            RuleKind::NotNull,
            RuleKind::Uniqueness,
            RuleKind::RowHash,
        ] {
            assert_eq!(tolerance(kind), 0.0);
        }
        let rule = RuleInstance::sum("amount").unwrap().with_tolerance(0.5).unwrap();
        assert_eq!(effective_tolerance(&rule), 0.5);
        assert_eq!(effective_tolerance(&RuleInstance::sum("amount").unwrap()), SUM_TOLERANCE);
    }

    #[test]
    fn transaction_templates() {
        let tests = template_tests("Transaction");
        let names: Vec<&str> = tests.iter().map(|test| test.name).collect();
        assert_eq!(names, vec!["row_count", "sum_amount", "distinct_cust"]);

        let rules = template_rules("transaction").unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].kind(), RuleKind::SumColumn);
        assert_eq!(rules[1].column(), Some("amount"));
        assert_eq!(rules[1].tolerance_override(), Some(0.001));
        assert_eq!(rules[1].sql(), Some("SELECT SUM(amount) FROM landing.transaction"));
        assert_eq!(
            rules[2].sql(),
            Some("SELECT COUNT(DISTINCT cust_id) FROM landing.transaction")
        );
    }

    #[test]
    fn customer_templates() {
        let rules = template_rules("customer").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_name(), "row_count");
        assert_eq!(rules[0].sql(), Some("SELECT COUNT(*) FROM landing.customer"));
        assert_eq!(rules[1].kind(), RuleKind::NotNull);
        assert_eq!(
            rules[1].sql(),
            Some("SELECT COUNT(*) FROM landing.customer WHERE email IS NULL")
        );
    }

    #[test]
    fn template_kinds_map_to_matching_rules() {
        let unique = TemplateTest {
            name: "unique_tran",
            description: "Transaction ids are unique",
            kind: RuleKind::Uniqueness,
            column: Some("tran_id"),
            tolerance: 0.0,
        };
        let rule = unique.to_rule("landing.transaction").unwrap();
        assert_eq!(rule.kind(), RuleKind::Uniqueness);
        assert_eq!(rule.column(), Some("tran_id"));
        assert_eq!(
            rule.sql(),
            Some(
                "SELECT tran_id, COUNT(*) FROM landing.transaction GROUP BY tran_id HAVING COUNT(*) > 1"
            )
        );

        let row_hash = TemplateTest {
            name: "row_hash",
            kind: RuleKind::RowHash,
            column: None,
            ..unique
        };
        assert_eq!(
            row_hash.to_rule("landing.transaction").unwrap_err(),
            ConfigError::MissingReference {
                kind: RuleKind::RowHash
            }
        );

        let columnless_sum = TemplateTest {
            kind: RuleKind::SumColumn,
            column: None,
            ..unique
        };
        assert!(columnless_sum.to_rule("landing.transaction").is_err());
    }

    #[test]
    fn unknown_table_has_no_templates() {
        assert!(template_tests("orders").is_empty());
        assert!(template_rules("orders").unwrap().is_empty());
        assert_eq!(known_tables(), vec!["customer", "transaction"]);
    }

    #[test]
    fn customer_mapping_marks_pii() {
        let mapping = table_mapping("customer").unwrap();
        let email = mapping
            .columns
            .iter()
            .find(|column| column.source == "email")
            .unwrap();
        assert!(email.pii);
        assert_eq!(email.masking, Some("hash_email"));
        assert_eq!(mapping.source_table, "saslib.customer");
    }
}

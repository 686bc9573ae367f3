//! Building comparison-ready DataFrames from raw cells.

use std::collections::BTreeSet;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::{debug, warn};

use parity_common::format_numeric;

use crate::error::{IngestError, Result};
use crate::normalize::{NormalizeOutcome, RawValue, Scalar, normalize_scalar};

/// Assembles named columns of raw cells into a DataFrame.
///
/// Column names are trimmed and lower-cased, every cell goes through
/// [`crate::normalize`], and each column gets the narrowest type that holds all
/// of its non-null values: Int64, Float64, Boolean, or String otherwise.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    columns: Vec<(String, Vec<RawValue>)>,
}

/// Value type seen while scanning a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Empty,
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    fn widen(self, scalar: &Scalar) -> Self {
        let seen = match scalar {
            Scalar::Null => return self,
            Scalar::Bool(_) => ColumnType::Bool,
            Scalar::Int(_) => ColumnType::Int,
            Scalar::Float(_) => ColumnType::Float,
            Scalar::Text(_) => ColumnType::Text,
        };
        match (self, seen) {
            (ColumnType::Empty, seen) => seen,
            (current, seen) if current == seen => current,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            _ => ColumnType::Text,
        }
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    #[must_use]
    pub fn column<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        self.columns.push((
            name.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Build the DataFrame.
    ///
    /// # Errors
    ///
    /// Fails when two columns share a name after lower-casing or when columns
    /// have different lengths. Normalization fallbacks never fail the build;
    /// they are logged per column.
    pub fn build(self) -> Result<DataFrame> {
        let expected_len = self.columns.first().map(|(_, values)| values.len());
        let mut seen = BTreeSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());

        for (raw_name, values) in self.columns {
            let name = raw_name.trim().to_lowercase();
            if !seen.insert(name.clone()) {
                return Err(IngestError::DuplicateColumn { column: name });
            }
            if let Some(expected) = expected_len
                && values.len() != expected
            {
                return Err(IngestError::RaggedColumns {
                    column: name,
                    expected,
                    found: values.len(),
                });
            }
            columns.push(build_column(&name, values));
        }

        let df = DataFrame::new(columns)?;
        debug!(rows = df.height(), columns = df.width(), "dataset built");
        Ok(df)
    }
}

fn build_column(name: &str, values: Vec<RawValue>) -> Column {
    let mut fallbacks = 0usize;
    let mut column_type = ColumnType::Empty;
    let mut cells = Vec::with_capacity(values.len());

    for raw in values {
        let (scalar, outcome) = normalize_scalar(raw);
        if outcome == NormalizeOutcome::Fallback {
            fallbacks += 1;
        }
        column_type = column_type.widen(&scalar);
        cells.push(scalar);
    }

    if fallbacks > 0 {
        warn!(
            column = name,
            fallback_count = fallbacks,
            "byte-code values out of byte range were kept unchanged"
        );
    }

    let series = match column_type {
        ColumnType::Int => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Scalar::Int(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::Float => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Scalar::Int(v) => Some(*v as f64),
                    Scalar::Float(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::Bool => Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| match cell {
                    Scalar::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        ),
        ColumnType::Text | ColumnType::Empty => Series::new(
            name.into(),
            cells.iter().map(scalar_text).collect::<Vec<_>>(),
        ),
    };
    series.into_column()
}

fn scalar_text(cell: &Scalar) -> Option<String> {
    match cell {
        Scalar::Null => None,
        Scalar::Bool(v) => Some(v.to_string()),
        Scalar::Int(v) => Some(v.to_string()),
        Scalar::Float(v) => Some(format_numeric(*v)),
        Scalar::Text(v) => Some(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{AnyValue, DataType};

    use super::*;

    #[test]
    fn lowercases_and_decodes() {
        let df = DatasetBuilder::new()
            .column(
                "First_Name",
                [
                    RawValue::Bytes(b"Alice   ".to_vec()),
                    RawValue::ByteCodes(vec![66, 111, 98]),
                ],
            )
            .column("CUST_ID", [1_i64, 2])
            .build()
            .unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["first_name", "cust_id"]);
        let first_names = df.column("first_name").unwrap();
        assert_eq!(first_names.get(0).unwrap(), AnyValue::String("Alice"));
        assert_eq!(first_names.get(1).unwrap(), AnyValue::String("Bob"));
        assert_eq!(df.column("cust_id").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn mixed_int_and_float_widen_to_float() {
        let df = DatasetBuilder::new()
            .column(
                "amount",
                [RawValue::from(10_i64), RawValue::from(2.5), RawValue::from(None::<f64>)],
            )
            .build()
            .unwrap();
        let amount = df.column("amount").unwrap();
        assert_eq!(amount.dtype(), &DataType::Float64);
        assert_eq!(amount.null_count(), 1);
    }

    #[test]
    fn mixed_text_and_numbers_become_text() {
        let df = DatasetBuilder::new()
            .column("code", [RawValue::from(1_i64), RawValue::from("A")])
            .build()
            .unwrap();
        let code = df.column("code").unwrap();
        assert_eq!(code.dtype(), &DataType::String);
        assert_eq!(code.get(0).unwrap(), AnyValue::String("1"));
    }

    #[test]
    fn fallback_byte_codes_are_kept_as_text() {
        let df = DatasetBuilder::new()
            .column("name", [RawValue::ByteCodes(vec![65, 300])])
            .build()
            .unwrap();
        let name = df.column("name").unwrap();
        assert_eq!(name.get(0).unwrap(), AnyValue::String("[65, 300]"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = DatasetBuilder::new()
            .column("Email", ["a"])
            .column("EMAIL", ["b"])
            .build()
            .unwrap_err();
        assert!(matches!(err, IngestError::DuplicateColumn { column } if column == "email"));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = DatasetBuilder::new()
            .column("a", [1_i64, 2])
            .column("b", [1_i64])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::RaggedColumns {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }
}

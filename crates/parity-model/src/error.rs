use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rule::RuleKind;

/// Which dataset a value or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The legacy (source-of-truth) dataset.
    Left,
    /// The migrated dataset.
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule instance was configured without what its kind needs.
///
/// Raised while building the rule list, never during a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The rule kind targets a column but none was given.
    #[error("rule '{kind}' requires a column")]
    MissingColumn { kind: RuleKind },

    /// The rule kind compares against a reference dataset but none was given.
    #[error("rule '{kind}' requires a reference dataset")]
    MissingReference { kind: RuleKind },

    /// A column was given to a rule kind that works on whole datasets.
    #[error("rule '{kind}' does not take a column (got '{column}')")]
    UnexpectedColumn { kind: RuleKind, column: String },

    /// The rule name does not match any known kind.
    #[error("unknown rule '{name}' (expected one of: {expected})")]
    UnknownRule { name: String, expected: String },

    /// Tolerance overrides must be finite and non-negative.
    #[error("tolerance must be a finite, non-negative number (got {value})")]
    InvalidTolerance { value: f64 },
}

/// A rule could not be evaluated against the datasets it was given.
///
/// The engine contains these inside a failed [`crate::RuleResult`] so that one
/// broken rule never stops the rest of a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The rule's column is absent from one side.
    #[error("column '{column}' not found in {side} dataset")]
    ColumnNotFound { column: String, side: Side },

    /// A numeric rule met a value that does not coerce to a number.
    #[error(
        "column '{column}' in {side} dataset could not be coerced to a number \
         (attempted f64 coercion of value '{value}')"
    )]
    TypeCoercion {
        column: String,
        side: Side,
        value: String,
    },

    /// A polars operation failed while reading a column.
    #[error("dataset operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for EvaluationError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

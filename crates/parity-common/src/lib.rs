//! Shared utilities for the parity crates.
//!
//! This crate provides the polars cell helpers used by both the ingest
//! boundary and the validation engine, so that both sides agree on what a
//! "missing" cell is and how a cell renders as text.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_to_f64, any_to_string, format_numeric, is_missing_value, is_numeric_dtype,
    is_text_dtype, parse_f64,
};

//! Dataset ingestion for parity validation.
//!
//! This crate turns legacy and migrated exports into Polars DataFrames that the
//! validation engine can compare directly.
//!
//! # Features
//!
//! - **Value normalization**: decode fixed-width legacy fields delivered as
//!   byte buffers or byte-code sequences into trimmed text
//! - **Dataset building**: assemble named columns of raw cells into a typed
//!   DataFrame with lower-cased column names
//! - **CSV loading**: read a CSV export with the same column-name conventions
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use parity_ingest::{LoadOptions, read_csv_dataset};
//!
//! let legacy = read_csv_dataset(Path::new("legacy/customer.csv"), &LoadOptions::default())?;
//! ```

mod csv;
mod dataset;
mod error;
mod normalize;

// === Error Types ===
pub use error::{IngestError, Result};

// === Normalization ===
pub use normalize::{
    NormalizeOutcome, RawValue, Scalar, normalize, normalize_scalar, normalize_with_outcome,
};

// === Dataset Construction ===
pub use dataset::DatasetBuilder;

// === CSV Reading ===
pub use csv::{LoadOptions, read_csv_dataset};

//! CSV loading for legacy and migrated exports.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::{
    CsvReadOptions, DataFrame, IntoSeries, PolarsError, SerReader, StringChunkedBuilder,
};
use tracing::{debug, info, warn};

use parity_common::is_text_dtype;

use crate::error::{IngestError, Result};

/// Options controlling how a CSV export becomes a dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Lower-case every column name (the engine's naming convention).
    pub lowercase_columns: bool,
    /// Trim leading/trailing whitespace of text cells, for exports that keep
    /// fixed-width padding.
    pub trim_text: bool,
    /// Rows used for schema inference (`None` scans the whole file).
    ///
    /// When a later row does not fit the inferred types the file is read
    /// again with every column as text, so a bad value surfaces per rule
    /// instead of failing the load.
    pub infer_schema_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            lowercase_columns: true,
            trim_text: false,
            infer_schema_length: None,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub fn with_trim_text(mut self, enable: bool) -> Self {
        self.trim_text = enable;
        self
    }

    #[must_use]
    pub fn with_lowercase_columns(mut self, enable: bool) -> Self {
        self.lowercase_columns = enable;
        self
    }

    #[must_use]
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }
}

/// Reads a CSV file with a single header row into a DataFrame.
pub fn read_csv_dataset(path: &Path, options: &LoadOptions) -> Result<DataFrame> {
    std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut df = match read_frame(path, options.infer_schema_length) {
        Ok(df) => df,
        Err(err) if options.infer_schema_length.is_some_and(|rows| rows > 0) => {
            warn!(
                path = %path.display(),
                error = %err,
                "inferred schema does not fit every row; reading all columns as text"
            );
            read_frame(path, Some(0))?
        }
        Err(err) => return Err(err),
    };

    if options.lowercase_columns {
        lowercase_column_names(&mut df)?;
    }
    if options.trim_text {
        trim_text_columns(&mut df)?;
    }

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "dataset loaded"
    );
    Ok(df)
}

/// `Some(0)` reads every column as text.
fn read_frame(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    let parse_error = |e: PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)
}

fn lowercase_column_names(df: &mut DataFrame) -> Result<()> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .iter()
        .map(|name| (name.to_string(), name.as_str().trim().to_lowercase()))
        .collect();
    let mut seen = BTreeSet::new();
    for (_, lowered) in &renames {
        if !seen.insert(lowered.as_str()) {
            return Err(IngestError::DuplicateColumn {
                column: lowered.clone(),
            });
        }
    }
    for (original, lowered) in renames {
        if original != lowered {
            df.rename(&original, lowered.into())?;
        }
    }
    Ok(())
}

fn trim_text_columns(df: &mut DataFrame) -> Result<()> {
    let text_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| is_text_dtype(column.dtype()))
        .map(|column| column.name().to_string())
        .collect();

    for name in text_columns {
        let trimmed = {
            let ca = df.column(&name)?.str()?;
            let mut builder = StringChunkedBuilder::new(name.as_str().into(), ca.len());
            for value in ca.into_iter() {
                match value {
                    Some(value) => builder.append_value(value.trim()),
                    None => builder.append_null(),
                }
            }
            builder.finish().into_series()
        };
        df.with_column(trimmed)?;
        debug!(column = %name, "trimmed text column");
    }
    Ok(())
}

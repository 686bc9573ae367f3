//! Machine-readable run reports.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use parity_model::{RuleResult, ValidationRun};

const REPORT_SCHEMA: &str = "migration-parity.validation-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct RunReportPayload<'a> {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub legacy_dataset: String,
    pub migrated_dataset: String,
    pub total: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub results: &'a [RuleResult],
}

impl<'a> RunReportPayload<'a> {
    pub fn new(legacy_dataset: &str, migrated_dataset: &str, run: &'a ValidationRun) -> Self {
        Self {
            schema: REPORT_SCHEMA,
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            legacy_dataset: legacy_dataset.to_string(),
            migrated_dataset: migrated_dataset.to_string(),
            total: run.total(),
            pass_count: run.pass_count(),
            fail_count: run.fail_count(),
            results: run.results(),
        }
    }
}

/// Write a validation run as pretty-printed JSON.
///
/// Parent directories are created as needed. Returns the written path.
pub fn write_run_report_json(
    output_path: &Path,
    legacy_dataset: &str,
    migrated_dataset: &str,
    run: &ValidationRun,
) -> std::io::Result<PathBuf> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let payload = RunReportPayload::new(legacy_dataset, migrated_dataset, run);
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(output_path, format!("{json}\n"))?;
    Ok(output_path.to_path_buf())
}

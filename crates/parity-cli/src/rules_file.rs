//! Rule configuration: JSON rules files and inline `KIND[:COLUMN]` flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use parity_ingest::{LoadOptions, read_csv_dataset};
use parity_model::{RuleInstance, RuleKind};

/// One entry of a rules file.
///
/// ```json
/// [
///   { "rule": "row_count" },
///   { "rule": "Sum Amount", "column": "amount", "tolerance": 0.001 },
///   { "rule": "row_hash", "reference": "expected.csv" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub rule: String,
    #[serde(default)]
    pub column: Option<String>,
    /// Reference CSV for row hash rules, relative to the rules file.
    #[serde(default)]
    pub reference: Option<PathBuf>,
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RuleSpec {
    /// Build a validated rule instance, loading the reference dataset when
    /// the rule kind uses one.
    pub fn build(&self, base_dir: &Path, options: &LoadOptions) -> Result<RuleInstance> {
        let kind: RuleKind = self.rule.parse()?;
        let reference = match &self.reference {
            Some(path) if kind.requires_reference() => {
                let path = base_dir.join(path);
                let df = read_csv_dataset(&path, options)
                    .with_context(|| format!("load reference dataset {}", path.display()))?;
                Some(df)
            }
            _ => None,
        };

        let mut rule = RuleInstance::new(kind, self.column.as_deref(), reference)
            .with_context(|| format!("configure rule '{}'", self.rule))?;
        if let Some(tolerance) = self.tolerance {
            rule = rule.with_tolerance(tolerance)?;
        }
        if let Some(name) = &self.name {
            rule = rule.with_name(name.as_str());
        }
        Ok(rule)
    }
}

/// Read a rules file.
pub fn load_rules_file(path: &Path) -> Result<Vec<RuleSpec>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read rules file {}", path.display()))?;
    parse_rules(&text).with_context(|| format!("parse rules file {}", path.display()))
}

/// Parse the JSON array of a rules file.
pub fn parse_rules(text: &str) -> Result<Vec<RuleSpec>> {
    Ok(serde_json::from_str(text)?)
}

/// Parse an inline `KIND[:COLUMN]` rule flag.
pub fn parse_inline_rule(value: &str, reference: Option<&Path>) -> RuleSpec {
    let (rule, column) = match value.split_once(':') {
        Some((rule, column)) => (rule, Some(column.trim().to_string())),
        None => (value, None),
    };
    RuleSpec {
        rule: rule.trim().to_string(),
        column: column.filter(|column| !column.is_empty()),
        reference: reference.map(Path::to_path_buf),
        tolerance: None,
        name: None,
    }
}

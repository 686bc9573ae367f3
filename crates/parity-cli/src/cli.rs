//! CLI argument definitions for the parity validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "parity",
    version,
    about = "Migration parity validator - compare a legacy export with its migrated copy",
    long_about = "Compare a legacy dataset with the dataset produced by a migration.\n\n\
                  Runs row count, sum, distinct count, not-null, uniqueness and row hash\n\
                  rules and reports a pass/fail verdict for each."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a migrated CSV export against its legacy export.
    Run(RunArgs),

    /// Suggest target columns for each rule kind.
    Suggest(SuggestArgs),

    /// List the canned tests of known tables.
    Templates(TemplatesArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Legacy (source of truth) CSV export.
    #[arg(value_name = "LEGACY_CSV")]
    pub legacy: PathBuf,

    /// Migrated CSV export.
    #[arg(value_name = "MIGRATED_CSV")]
    pub migrated: PathBuf,

    /// JSON rules file (array of {"rule", "column", "reference", "tolerance", "name"}).
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Add the canned tests of a known table (customer, transaction).
    #[arg(long = "table", value_name = "NAME")]
    pub table: Option<String>,

    /// Add a rule inline, e.g. `--rule row_count` or `--rule sum:amount`.
    #[arg(long = "rule", value_name = "KIND[:COLUMN]")]
    pub rule: Vec<String>,

    /// Reference CSV for inline row hash rules.
    #[arg(long = "reference", value_name = "CSV")]
    pub reference: Option<PathBuf>,

    /// Evaluate rules on up to N worker threads.
    #[arg(long = "parallel", value_name = "N", default_value_t = 1)]
    pub parallel: usize,

    /// Write a JSON report of the run.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,

    /// Trim leading/trailing whitespace of text cells while loading.
    #[arg(long = "trim-text")]
    pub trim_text: bool,
}

#[derive(Parser)]
pub struct SuggestArgs {
    /// CSV export to inspect.
    #[arg(value_name = "CSV")]
    pub dataset: PathBuf,

    /// Only show suggestions for this rule kind.
    #[arg(long = "rule", value_name = "KIND")]
    pub rule: Option<String>,
}

#[derive(Parser)]
pub struct TemplatesArgs {
    /// Only list this table's tests.
    #[arg(long = "table", value_name = "NAME")]
    pub table: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use parity_cli::rules_file::{load_rules_file, parse_inline_rule};
use parity_cli::summary::{suggestions_table, templates_table};
use parity_ingest::{LoadOptions, read_csv_dataset};
use parity_model::{RuleKind, ValidationRun};
use parity_validate::{
    RuleStore, TABLE_MAPPINGS, default_column, known_tables, run_all, run_all_parallel,
    suggest_columns, table_mapping, template_tests, write_run_report_json,
};

use crate::cli::{RunArgs, SuggestArgs, TemplatesArgs};

/// Outcome of `parity run`.
pub struct RunOutcome {
    pub legacy: String,
    pub migrated: String,
    pub run: ValidationRun,
    pub report: Option<PathBuf>,
}

pub fn run_validation(args: &RunArgs) -> Result<RunOutcome> {
    let legacy = args.legacy.display().to_string();
    let migrated = args.migrated.display().to_string();
    let run_span = info_span!("run", legacy = %legacy, migrated = %migrated);
    let _run_guard = run_span.enter();
    let start = Instant::now();

    let options = LoadOptions::default().with_trim_text(args.trim_text);
    let left = read_csv_dataset(&args.legacy, &options)
        .with_context(|| format!("load legacy dataset {legacy}"))?;
    let right = read_csv_dataset(&args.migrated, &options)
        .with_context(|| format!("load migrated dataset {migrated}"))?;

    let store = build_rule_store(args, &options)?;
    if store.is_empty() {
        bail!("no rules configured; pass --rules, --table or --rule");
    }
    debug!(rules = store.len(), workers = args.parallel, "rules configured");

    let run = if args.parallel > 1 {
        run_all_parallel(store.as_slice(), &left, &right, args.parallel)
    } else {
        run_all(store.as_slice(), &left, &right)
    };

    let report = match &args.report_json {
        Some(path) => Some(
            write_run_report_json(path, &legacy, &migrated, &run)
                .with_context(|| format!("write report {}", path.display()))?,
        ),
        None => None,
    };

    info!(
        rules = run.total(),
        passed = run.pass_count(),
        failed = run.fail_count(),
        duration_ms = start.elapsed().as_millis(),
        "run complete"
    );

    Ok(RunOutcome {
        legacy,
        migrated,
        run,
        report,
    })
}

/// Rules file entries first, then table templates, then inline rules.
fn build_rule_store(args: &RunArgs, options: &LoadOptions) -> Result<RuleStore> {
    let mut store = RuleStore::new();

    if let Some(path) = &args.rules {
        let base_dir = path.parent().unwrap_or(Path::new("."));
        for spec in load_rules_file(path)? {
            store.add(spec.build(base_dir, options)?);
        }
    }

    if let Some(table) = &args.table
        && store
            .extend_from_templates(table)
            .with_context(|| format!("templates for table '{table}'"))?
            == 0
    {
        bail!(
            "unknown table '{table}' (known tables: {})",
            known_tables().join(", ")
        );
    }

    for value in &args.rule {
        let spec = parse_inline_rule(value, args.reference.as_deref());
        store.add(
            spec.build(Path::new("."), options)
                .with_context(|| format!("--rule {value}"))?,
        );
    }

    Ok(store)
}

pub fn run_suggest(args: &SuggestArgs) -> Result<()> {
    let df = read_csv_dataset(&args.dataset, &LoadOptions::default())
        .with_context(|| format!("load dataset {}", args.dataset.display()))?;

    let kinds = match &args.rule {
        Some(rule) => vec![rule.parse::<RuleKind>()?],
        None => RuleKind::ALL
            .iter()
            .copied()
            .filter(RuleKind::requires_column)
            .collect(),
    };
    let rows: Vec<(String, Vec<String>, Option<String>)> = kinds
        .into_iter()
        .map(|kind| {
            (
                kind.label().to_string(),
                suggest_columns(kind, &df),
                default_column(kind, &df),
            )
        })
        .collect();

    println!("{}", suggestions_table(&rows));
    Ok(())
}

pub fn run_templates(args: &TemplatesArgs) -> Result<()> {
    let mappings = match &args.table {
        Some(table) => match table_mapping(table) {
            Some(mapping) => vec![mapping],
            None => bail!(
                "unknown table '{table}' (known tables: {})",
                known_tables().join(", ")
            ),
        },
        None => TABLE_MAPPINGS.iter().collect(),
    };

    for mapping in mappings {
        println!("{} -> {}", mapping.source_table, mapping.target_table);
        let tests = template_tests(mapping.name);
        println!(
            "{}",
            templates_table(mapping.name, mapping.target_table, &tests)
        );
    }
    Ok(())
}

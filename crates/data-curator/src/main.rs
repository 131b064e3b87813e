//! CLI entry point for the data curator.

use anyhow::{Context, Result};
use clap::Parser;
use data_curator::reporting::checker_output;
use data_curator::{
    CheckName, ColumnStatus, CurationResult, CuratorConfig, CuratorError, DataChecks, DataFiles,
    Metadata, Params, Pipeline, RowStatus,
};
use serde_json::json;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Pre-modeling data-quality gate",
    long_about = "Checks one dataset (total) or a train/test pair for data-quality issues \
                  and applies leak-safe remediation.\n\n\
                  EXAMPLES:\n  \
                  # Single dataset, last column is the target\n  \
                  data-curator data.csv\n\n  \
                  # Train/test pair with an explicit target\n  \
                  data-curator train.csv test.csv -t Survived\n\n  \
                  # Unsupervised, median imputation\n  \
                  data-curator data.csv --no-target -p '{\"numeric_imputation_method\": \"median\"}'\n\n  \
                  # Checks only, nothing remediated\n  \
                  data-curator train.csv test.csv --dry-run"
)]
struct Args {
    /// One data file (total) or two (train, then test)
    #[arg(required = true, num_args = 1..)]
    filenames: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Treat the data as unsupervised
    #[arg(long, conflicts_with = "target_col")]
    no_target: bool,

    /// Target column (default: last column of the main dataset)
    #[arg(short, long)]
    target_col: Option<String>,

    /// Imputation parameters as a JSON object
    ///
    /// Keys: numeric_imputation_method (mean, median, most_frequent),
    /// categorical_imputation_method (most_frequent)
    #[arg(short, long)]
    params: Option<String>,

    /// Output directory (default: folder of the first data file)
    #[arg(short, long)]
    output: Option<String>,

    /// Unique-value count at or below which a column is discrete
    #[arg(long, default_value_t = data_curator::config::DEFAULT_CAT_TO_NUM_THRESHOLD)]
    threshold: usize,

    /// Replace check matrices by their shape in data_checker_output.json
    #[arg(long)]
    no_flatten: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Run the checks only; nothing is remediated
    #[arg(long)]
    dry_run: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(verbose: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json);

    let files = DataFiles::from_filenames(&args.filenames)?;
    let config = build_config(&args)?;
    let pipeline = Pipeline::builder().config(config).build()?;

    if args.dry_run {
        return run_dry_run(&pipeline, &files, &args);
    }

    let result = pipeline.run_files(&files).map_err(report_failure)?;

    if args.json {
        let report = json!({
            "metadata": result.metadata,
            "checks": checker_output(&result.checks, !args.no_flatten)?,
            "processing": result.ledger,
            "imputers": result.imputers,
            "written_files": result.written_files,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&result);
    }
    Ok(())
}

/// Log a failed run, with a hint when the inputs themselves are malformed.
fn report_failure(e: CuratorError) -> CuratorError {
    error!("Curation failed: {}", e);
    if e.is_schema_error() {
        error!(
            "Check that train and test share their feature columns and that the target exists"
        );
    }
    e
}

fn build_config(args: &Args) -> Result<CuratorConfig> {
    let params = match &args.params {
        Some(raw) => Params::from_json_str(raw).context("Invalid --params")?,
        None => Params::default(),
    };

    let mut builder = CuratorConfig::builder()
        .cat_to_num_threshold(args.threshold)
        .params(params)
        .no_target(args.no_target)
        .flatten_check_matrices(!args.no_flatten);

    if let Some(target) = &args.target_col {
        builder = builder.target_column(target);
    }
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }

    Ok(builder.build()?)
}

/// Run the checks and print what remediation would do.
///
/// Uses `println!` intentionally: the preview is the primary output.
fn run_dry_run(pipeline: &Pipeline, files: &DataFiles, args: &Args) -> Result<()> {
    let (metadata, checks) = pipeline.check_files(files).map_err(report_failure)?;

    if args.json {
        let report = json!({
            "metadata": metadata,
            "checks": checker_output(&checks, !args.no_flatten)?,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Data checks only");
    println!("{}\n", "=".repeat(80));
    print_setup(&metadata);
    print_check_table(&metadata, &checks);

    println!("PROPOSED ACTIONS");
    println!("{}", "-".repeat(40));
    if let Some(matrix) = checks.matrix(metadata.main_data_key) {
        let target = metadata.main_target_col.as_deref();
        let not_target = |cols: Vec<String>| -> Vec<String> {
            cols.into_iter().filter(|c| Some(c.as_str()) != target).collect()
        };
        println!(
            "  Remove (critical cardinality): {:?}",
            not_target(matrix.failing(CheckName::CriticalCardinality))
        );
        println!(
            "  Remove (duplicates): {:?}",
            not_target(matrix.failing(CheckName::Duplicate))
        );
        println!(
            "  Impute (missing values): {:?}",
            not_target(matrix.failing(CheckName::MissingValue))
        );
    }
    println!();
    println!("{}", "=".repeat(80));
    println!("To execute remediation, run without --dry-run");
    println!("{}", "=".repeat(80));
    Ok(())
}

fn print_setup(metadata: &Metadata) {
    println!("ML PROBLEM SETUP");
    println!("{}", "-".repeat(40));
    println!("  Split: {}", metadata.split_type);
    if let Some(learning_type) = metadata.learning_type {
        println!("  Learning type: {}", learning_type);
    }
    match &metadata.main_target_col {
        Some(target) => println!("  Target column: {}", target),
        None => println!("  Target column: none"),
    }
    if let (Some(minority), Some(pct)) =
        (&metadata.minority_class, metadata.minority_class_percentage)
    {
        println!("  Minority class: {} ({}%)", minority, pct);
    }
    println!();
}

fn print_check_table(metadata: &Metadata, checks: &DataChecks) {
    for key in metadata.data_keys() {
        let Some(matrix) = checks.matrix(key) else {
            continue;
        };
        println!("COLUMN CHECKS ({})", key);
        println!("{}", "-".repeat(40));
        println!(
            "{:<20} {:<14} {:<10} {:<10} {:<10} {:<10}",
            "Column", "Dtype", "Missing", "Critical", "Low card", "Duplicate"
        );
        println!("{}", "-".repeat(78));

        for column in &matrix.columns {
            let cell = |check: CheckName| {
                matrix
                    .verdict(check, column)
                    .map(|v| v.as_str())
                    .unwrap_or("-")
            };
            let dtype = metadata
                .dtype_of(key, column)
                .map(|d| d.as_str())
                .unwrap_or("-");
            println!(
                "{:<20} {:<14} {:<10} {:<10} {:<10} {:<10}",
                truncate_str(column, 19),
                dtype,
                cell(CheckName::MissingValue),
                cell(CheckName::CriticalCardinality),
                cell(CheckName::LowCardinality),
                cell(CheckName::Duplicate)
            );
        }
        println!();
    }

    if let Some(reco) = &checks.validation_reco {
        println!("Validation: {:?}", reco);
    }
    if let Some(balance) = &checks.class_balance {
        let ratio = balance
            .ratio
            .map(|r| format!("{:.3}", r))
            .unwrap_or_else(|| "n/a".to_string());
        println!("Class balance: {} (ratio {})", balance.verdict, ratio);
    }
    println!();
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

/// Print a human-readable summary of a finished run.
fn print_human_readable_summary(result: &CurationResult) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CURATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    print_setup(&result.metadata);

    for key in result.metadata.data_keys() {
        let removed: Vec<&str> = result
            .ledger
            .column_processing
            .get(&key)
            .into_iter()
            .flatten()
            .filter(|(_, status)| status.is_removal())
            .map(|(column, _)| column.as_str())
            .collect();
        let imputed = result.ledger.columns_with(key, ColumnStatus::Imputed);

        println!("{} data:", key);
        if let Some(df) = result.data.get(key) {
            println!("  Shape: {} rows x {} columns", df.height(), df.width());
        }
        println!("  Removed columns: {:?}", removed);
        println!("  Imputed columns: {:?}", imputed);
    }
    println!();

    match result.ledger.row_processing {
        RowStatus::Pass => println!("Rows: {}", RowStatus::Pass),
        RowStatus::DroppedNullTargetRows => println!(
            "Rows: {} null target rows dropped",
            result.ledger.dropped_target_rows
        ),
    }

    if !result.written_files.is_empty() {
        println!();
        println!("Files written:");
        for path in &result.written_files {
            println!("  - {}", path.display());
        }
    }
    info!("{} FAIL verdicts in total", result.checks.fail_count());

    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

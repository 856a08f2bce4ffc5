//! CLI entry point for the retail cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use retail_cleaning::{
    CleaningConfig, CleaningError, Dataset, EtlPipeline, FileSink, LocalFileSource, OutputFormat,
    RunSummary,
};
use std::path::Path;
use tracing::{error, info};

/// CLI-compatible output format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli: CliOutputFormat) -> Self {
        match cli {
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Retail data cleaning pipeline",
    long_about = "Extracts the raw retail tables, applies the per-dataset cleaning rules \
                  and loads the results under their destination table names.\n\n\
                  EXAMPLES:\n  \
                  # Clean every dataset found in ./data\n  \
                  retail-cleaning -i data\n\n  \
                  # Clean only users and products, write Parquet\n  \
                  retail-cleaning -i data --dataset users --dataset products --format parquet\n\n  \
                  # Machine-readable summary\n  \
                  retail-cleaning -i data --json | jq .total_duration_ms"
)]
struct Args {
    /// Directory holding the raw extracts
    ///
    /// Defaults to the configured input directory ("data")
    #[arg(short, long)]
    input: Option<String>,

    /// Output directory for cleaned tables
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Dataset to process (repeatable); all datasets when omitted
    ///
    /// Accepts dataset names (users, cards, stores, products, orders,
    /// date_times), raw file stems or destination table names.
    #[arg(long = "dataset")]
    datasets: Vec<Dataset>,

    /// Output file format
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// JSON file with cleaning configuration
    #[arg(long)]
    config: Option<String>,

    /// Literal string that marks a missing value in the raw data
    #[arg(long)]
    null_sentinel: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the run summary.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(args: &Args) -> Result<CleaningConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading configuration from: {}", path);
            CleaningConfig::from_json_file(path)?
        }
        None => CleaningConfig::default(),
    };

    if let Some(ref input) = args.input {
        config.input_dir = input.into();
    }
    config.output_dir = args.output.clone().into();
    if let Some(format) = args.format {
        config.output_format = format.into();
    }
    if let Some(ref sentinel) = args.null_sentinel {
        config.null_sentinel = sentinel.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let config = build_config(&args)?;

    if !Path::new(&config.input_dir).exists() {
        return Err(anyhow!(
            "Input directory not found: {}",
            config.input_dir.display()
        ));
    }

    let datasets: Vec<Dataset> = if args.datasets.is_empty() {
        Dataset::ALL.to_vec()
    } else {
        args.datasets.clone()
    };

    let source = LocalFileSource::new(&config.input_dir);
    let sink = FileSink::new(&config.output_dir, config.output_format);
    let pipeline = EtlPipeline::new(config);

    info!("{}", "=".repeat(80));
    info!("Starting retail cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let summary = match pipeline.run(&source, &sink, &datasets) {
        Ok(summary) => summary,
        Err(e) => {
            let message = failure_message(&e);
            error!("{}", message);
            if args.json {
                println!("{}", serde_json::json!({ "success": false, "error": e }));
            }
            return Err(anyhow!(message));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_human_readable_summary(&summary, sink.output_dir());
    Ok(())
}

/// Exit message for a failed run; bad input data is reported apart from
/// environment failures (missing files, IO, config).
fn failure_message(error: &CleaningError) -> String {
    if error.is_data_error() {
        format!("Input data rejected: {}", error)
    } else {
        format!("Pipeline failed: {}", error)
    }
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(summary: &RunSummary, output_dir: &Path) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Output directory: {}", output_dir.display());
    println!();

    println!(
        "{:<12} {:<20} {:>16} {:>12} {:>10}",
        "Dataset", "Table", "Rows", "Columns", "Time"
    );
    println!("{}", "-".repeat(74));
    for ds in &summary.datasets {
        println!(
            "{:<12} {:<20} {:>16} {:>12} {:>8}ms",
            ds.dataset.name(),
            ds.destination_table,
            format!("{} -> {}", ds.rows_before, ds.rows_after),
            format!("{} -> {}", ds.columns_before, ds.columns_after),
            ds.duration_ms
        );
    }
    println!();

    println!("Total: {} rows removed in {}ms", summary.total_rows_removed(), summary.total_duration_ms);
    println!("{}", "=".repeat(80));
}

//! CLI entry point for the filing timing analyses.
//!
//! Each subcommand ingests the detected-time dataset once, runs one analysis
//! (or all of them), logs summary statistics, and writes chart-ready series
//! and JSON summaries to the output directory.

use anyhow::{Context, Result, anyhow};
use chrono::Weekday;
use clap::{Parser, Subcommand};
use filing_timing::analyzers::report;
use filing_timing::config::AnalysisConfig;
use filing_timing::construct::construct_dataset;
use filing_timing::ingest::{self, ErrorMode, Ingested};
use filing_timing::normalize::Normalizer;
use filing_timing::output::{print_pretty, write_json, write_rejected, write_report};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "filing_timing")]
#[command(about = "Acceptance and detection timing analyses for regulatory filings", long_about = None)]
struct Cli {
    /// Detected-time dataset (CSV, optionally gzip-compressed)
    #[arg(short, long, global = true, default_value = "data/detected_time.csv")]
    input: PathBuf,

    /// Directory for series CSVs and JSON summaries
    #[arg(short, long, global = true, default_value = "plots")]
    output_dir: PathBuf,

    /// JSON analysis config (falls back to FILING_TIMING_CONFIG, then defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Abort on the first record with a missing or malformed timestamp
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average share of daily acceptances per time-of-day bucket, with cumulative totals
    Clustering,
    /// Filing size vs detection delay for same-day filings
    DelaySize,
    /// Acceptance vs detection time of day, with a weekday/form-type subset
    DetectionTiming {
        /// Acceptance weekday of the subset (e.g. "fri", "Friday")
        #[arg(short, long, default_value = "fri")]
        weekday: String,

        /// Submission type of the subset
        #[arg(short = 't', long, default_value = "8-K")]
        submission_type: String,
    },
    /// Earliest and latest acceptance times, keeping all ties
    Extremes,
    /// Run every analysis over a single ingestion
    All {
        #[arg(short, long, default_value = "fri")]
        weekday: String,

        #[arg(short = 't', long, default_value = "8-K")]
        submission_type: String,
    },
    /// Join a filings export with a master submissions export into the dataset
    Construct {
        /// Filings export with accessionNumber, submissionType, detectedTime
        #[arg(long, default_value = "filings.csv")]
        filings: PathBuf,

        /// Master export with accessionNumber, acceptanceDateTime, size
        #[arg(long, default_value = "sec_master_submissions.csv")]
        master: PathBuf,

        /// Where to write the joined dataset
        #[arg(long, default_value = "data/detected_time.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/filing_timing.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("filing_timing.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    print_pretty(&config);

    let mode = if cli.strict {
        ErrorMode::Strict
    } else {
        ErrorMode::Skip
    };

    match cli.command {
        Commands::Construct {
            filings,
            master,
            output,
        } => {
            construct_dataset(&filings, &master, &output)?;
        }
        Commands::Clustering => {
            let ingested = load(&cli.input, &config, mode, &cli.output_dir)?;
            run_clustering(&ingested, &config, &cli.output_dir)?;
        }
        Commands::DelaySize => {
            let ingested = load(&cli.input, &config, mode, &cli.output_dir)?;
            run_delay_size(&ingested, &config, &cli.output_dir)?;
        }
        Commands::DetectionTiming {
            weekday,
            submission_type,
        } => {
            let weekday = parse_weekday(&weekday)?;
            let ingested = load(&cli.input, &config, mode, &cli.output_dir)?;
            run_detection_timing(&ingested, &config, &cli.output_dir, weekday, &submission_type)?;
        }
        Commands::Extremes => {
            let ingested = load(&cli.input, &config, mode, &cli.output_dir)?;
            run_extremes(&ingested, &config, &cli.output_dir)?;
        }
        Commands::All {
            weekday,
            submission_type,
        } => {
            let weekday = parse_weekday(&weekday)?;
            let ingested = load(&cli.input, &config, mode, &cli.output_dir)?;
            run_clustering(&ingested, &config, &cli.output_dir)?;
            run_delay_size(&ingested, &config, &cli.output_dir)?;
            run_detection_timing(&ingested, &config, &cli.output_dir, weekday, &submission_type)?;
            run_extremes(&ingested, &config, &cli.output_dir)?;
        }
    }

    Ok(())
}

/// Resolves the analysis config from `--config`, then `FILING_TIMING_CONFIG`,
/// then built-in defaults.
fn load_config(path: Option<&str>) -> Result<AnalysisConfig> {
    let path = path
        .map(str::to_string)
        .or_else(|| std::env::var("FILING_TIMING_CONFIG").ok());

    let config = match path {
        Some(path) => {
            info!(path = %path, "Loading analysis config");
            AnalysisConfig::load(&path)?
        }
        None => {
            let config = AnalysisConfig::default();
            config.validate()?;
            config
        }
    };
    Ok(config)
}

fn parse_weekday(raw: &str) -> Result<Weekday> {
    raw.parse::<Weekday>()
        .map_err(|_| anyhow!("unrecognized weekday {raw:?}"))
}

/// Reads and normalizes the dataset, writing any rejected rows alongside the
/// reports.
fn load(
    input: &Path,
    config: &AnalysisConfig,
    mode: ErrorMode,
    output_dir: &Path,
) -> Result<Ingested> {
    let normalizer = Normalizer::new(config.tz()?);
    let ingested = ingest::load(input, &normalizer, mode)
        .with_context(|| format!("failed to ingest {}", input.display()))?;
    write_rejected(output_dir, &ingested.rejected)?;
    Ok(ingested)
}

fn run_clustering(ingested: &Ingested, config: &AnalysisConfig, output_dir: &Path) -> Result<()> {
    let report = report::clustering(&ingested.records, config)?;
    report.log_summary();
    write_report(output_dir, "acceptance_clustering", &report, &report.series)?;
    Ok(())
}

fn run_delay_size(ingested: &Ingested, config: &AnalysisConfig, output_dir: &Path) -> Result<()> {
    let report = report::delay_size(&ingested.records, config)?;
    report.log_summary();
    write_report(output_dir, "size_vs_delay", &report, &report.series)?;
    Ok(())
}

fn run_detection_timing(
    ingested: &Ingested,
    config: &AnalysisConfig,
    output_dir: &Path,
    weekday: Weekday,
    submission_type: &str,
) -> Result<()> {
    let report = report::detection_timing(&ingested.records, config, weekday, submission_type)?;
    report.log_summary();
    write_report(output_dir, "acceptance_vs_detection", &report, &report.series)?;
    Ok(())
}

fn run_extremes(ingested: &Ingested, config: &AnalysisConfig, output_dir: &Path) -> Result<()> {
    let report = report::extremes(&ingested.records, config)?;
    report.log_summary();
    std::fs::create_dir_all(output_dir)?;
    write_json(&output_dir.join("acceptance_extremes.json"), &report)
}

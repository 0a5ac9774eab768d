//! LeadLab CLI: backtest composite leading indexes against recession history.
//!
//! Commands:
//! - `run`: analyse one model from a TOML config
//! - `compare`: run every configured model on the same data
//! - `weights`: average a sheet of weight submissions into class weights

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_appender::non_blocking;
use tracing_subscriber::{prelude::*, EnvFilter};

use leadlab_core::domain::IndicatorId;
use leadlab_runner::data_loader::load_submissions;
use leadlab_runner::{
    aggregate_submissions, compare_from_config, normalize_to_percent, run_analysis,
    AnalysisConfig, AnalysisResult, ClassForecasts, ClassWeights, ComparisonRow,
};

#[derive(Parser)]
#[command(
    name = "leadlab",
    about = "LeadLab CLI: composite leading index and recession-signal backtesting"
)]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one model from a TOML config file.
    Run {
        /// Path to the analysis TOML.
        #[arg(long)]
        config: PathBuf,

        /// Model name. Defaults to the first [[model]].
        #[arg(long)]
        model: Option<String>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the full result JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run every configured model on the same data and compare them.
    Compare {
        /// Path to the analysis TOML.
        #[arg(long)]
        config: PathBuf,

        /// Print rows as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Average a CSV of weight submissions into class weights and summarize
    /// any forecasts submitted with them.
    Weights {
        /// CSV with a `submitter` column followed by indicator and forecast columns.
        #[arg(long)]
        submissions: PathBuf,

        /// Rescale the averaged weights to sum to 100.
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Print as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Run {
            config,
            model,
            json,
            output,
        } => run_cmd(&config, model.as_deref(), json, output.as_deref()),
        Commands::Compare { config, json } => compare_cmd(&config, json),
        Commands::Weights {
            submissions,
            normalize,
            json,
        } => weights_cmd(&submissions, normalize, json),
    }
}

fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let (writer, guard) = non_blocking(file);
        // The guard must outlive every log call; leak it for the life of the process.
        let _guard = Box::leak(Box::new(guard));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn run_cmd(config_path: &Path, model: Option<&str>, json: bool, output: Option<&Path>) -> Result<()> {
    let config = AnalysisConfig::from_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let result = run_analysis(&config, model)?;

    if let Some(path) = output {
        write_json(path, &result)?;
        println!("Result saved to: {}", path.display());
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn compare_cmd(config_path: &Path, json: bool) -> Result<()> {
    let config = AnalysisConfig::from_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let rows = compare_from_config(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_comparison(&rows);
    }
    Ok(())
}

fn weights_cmd(path: &Path, normalize: bool, json: bool) -> Result<()> {
    let submissions = load_submissions(path)?;
    if submissions.is_empty() {
        bail!("no submissions found in {}", path.display());
    }
    let mut class = aggregate_submissions(&submissions);
    if normalize {
        class.weights = normalize_to_percent(&class.weights);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&class)?);
    } else {
        print_weights(&class);
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn print_summary(result: &AnalysisResult) {
    let r = &result.report;
    println!();
    println!("=== Analysis Result ===");
    println!("Model:          {}", result.model);
    println!(
        "Run ID:         {}",
        result.run_id.get(..16).unwrap_or(&result.run_id)
    );
    match (result.index.first(), result.index.last()) {
        (Some(first), Some(last)) => {
            println!("Period:         {} to {}", first.date, last.date)
        }
        _ => println!("Period:         (no observations)"),
    }
    println!(
        "Index:          min {:.2}  max {:.2}  mean {:.2}  median {:.2}",
        result.index_stats.min,
        result.index_stats.max,
        result.index_stats.mean,
        result.index_stats.median
    );
    println!("Threshold:      {:.2}", result.threshold);
    println!();
    println!("--- Signals ---");
    for outcome in &result.classified.outcomes {
        let lead = outcome
            .lead_time_months
            .map(|m| format!("{m} mo"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:>6.2}  {:<15} {}",
            outcome.signal.date, outcome.signal.value, outcome.classification, lead
        );
    }
    for missed in &result.classified.missed_recessions {
        println!("MISSED recession {} to {}", missed.start, missed.end);
    }
    println!();
    println!("--- Performance ---");
    println!("True Positives: {}", r.true_positives);
    println!("False Positives:{}", r.false_positives);
    println!("Coincident:     {}", r.coincident_signals);
    println!(
        "Detected:       {} of {} recessions",
        r.detected_recessions, r.total_recessions
    );
    println!("Avg Lead Time:  {:.1} months", r.avg_lead_time_months);
    println!("Detection Rate: {:.1}%", r.detection_rate_pct);
    println!("Accuracy:       {:.1}%", r.accuracy_pct);
    println!();
}

fn print_comparison(rows: &[ComparisonRow]) {
    println!();
    println!(
        "{:<16} {:>9} {:>7} {:>4} {:>4} {:>5} {:>7} {:>9} {:>9}",
        "Model", "Threshold", "Signals", "TP", "FP", "Coinc", "Lead", "Detect%", "Accuracy%"
    );
    for row in rows {
        let r = &row.report;
        println!(
            "{:<16} {:>9.2} {:>7} {:>4} {:>4} {:>5} {:>7.1} {:>9.1} {:>9.1}",
            row.model,
            row.threshold,
            row.signal_count,
            r.true_positives,
            r.false_positives,
            r.coincident_signals,
            r.avg_lead_time_months,
            r.detection_rate_pct,
            r.accuracy_pct
        );
    }
    println!();
}

fn print_weights(class: &ClassWeights) {
    println!();
    println!("=== Class Weights ({} submissions) ===", class.submitters);
    println!(
        "{:<36} {:>6} {:>8} {:>6} {:>6}",
        "Indicator", "Weight", "Avg", "Min", "Max"
    );
    for id in IndicatorId::ALL {
        let Some(summary) = class.summaries.get(&id) else {
            continue;
        };
        println!(
            "{:<36} {:>6.0} {:>8.2} {:>6.0} {:>6.0}",
            id.label(),
            class.weights.get(id),
            summary.avg,
            summary.min,
            summary.max
        );
    }
    println!("{:<36} {:>6.0}", "Total", class.weights.total());
    println!();
    if !class.forecasts.is_empty() {
        print_forecasts(&class.forecasts);
    }
}

fn print_forecasts(forecasts: &ClassForecasts) {
    println!("=== Class Forecasts ===");
    println!(
        "{:<36} {:>8} {:>8} {:>8} {:>8}",
        "Forecast", "Mean", "Median", "Min", "Max"
    );
    for (field, summary) in &forecasts.summaries {
        let s = &summary.stats;
        println!(
            "{:<36} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
            field.label(),
            s.mean,
            s.median,
            s.min,
            s.max
        );
    }
    if !forecasts.probability_bands.is_empty() {
        println!();
        println!("--- Recession Probability ---");
        for band in &forecasts.probability_bands {
            println!(
                "{:<22} {:>3} ({:.1}%)",
                band.band.label(),
                band.count,
                band.share_pct
            );
        }
    }
    for (field, summary) in &forecasts.summaries {
        println!();
        println!("--- {} histogram ---", field.label());
        for bin in &summary.histogram {
            println!("{:>7.1} - {:<7.1} {}", bin.start, bin.end, "#".repeat(bin.count));
        }
    }
    println!();
}

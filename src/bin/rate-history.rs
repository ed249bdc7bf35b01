//! rate-history CLI - generate downsampled exchange-rate history
//!
//! ## Example Usage
//!
//! ```bash
//! # Rebuild every period artifact from ./data into ./history
//! rate-history
//!
//! # Rebuild two periods as of a fixed day
//! rate-history generate --reference-date 2024-01-10 --period week --period year
//!
//! # File a fetched provider response as today's snapshot
//! rate-history record latest.json
//!
//! # Store the provider's currency name list
//! rate-history record-currencies currencies.json
//!
//! # Show the edge cache lifetime for a published path
//! rate-history ttl /history/week.json
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rate_history::cache_policy::{cache_ttl, history_artifact_path};
use rate_history::calendar::{parse_date, today_utc};
use rate_history::config::Settings;
use rate_history::engine::{HistoryEngine, PeriodOutcome, RunReport};
use rate_history::ingest::{record_currency_list, record_snapshot};
use rate_history::retention::{default_periods, select_periods};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// rate-history: downsampled exchange-rate history for charts
#[derive(Parser)]
#[command(name = "rate-history")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Downsampled exchange-rate history artifacts from daily snapshots", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Artifact output directory (overrides config)
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild period artifacts (default)
    Generate {
        /// Last day of every lookback window (YYYY-MM-DD, default: today UTC)
        #[arg(short = 'r', long)]
        reference_date: Option<String>,

        /// Only generate these periods
        #[arg(short = 'p', long = "period", value_name = "ID")]
        periods: Vec<String>,

        /// Process periods in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Record a provider response as the latest and dated snapshot
    Record {
        /// Provider JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Snapshot date (YYYY-MM-DD, default: today UTC)
        #[arg(short = 'd', long)]
        date: Option<String>,
    },

    /// Record a provider currency name list
    RecordCurrencies {
        /// Provider JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the period policy table
    Periods,

    /// Print the Cache-Control value served for a path
    Ttl {
        /// Request path, e.g. /history/week.json
        #[arg(value_name = "PATH")]
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(history_dir) = cli.history_dir {
        settings.history_dir = history_dir;
    }

    match cli.command.unwrap_or(Commands::Generate {
        reference_date: None,
        periods: Vec::new(),
        parallel: false,
    }) {
        Commands::Generate {
            reference_date,
            periods,
            parallel,
        } => generate(settings, reference_date, periods, parallel),
        Commands::Record { file, date } => record(&settings, file, date),
        Commands::RecordCurrencies { file } => {
            let raw =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let (path, changed) = record_currency_list(&raw, &settings)?;
            print_write_status(&path, changed);
            Ok(0)
        }
        Commands::Periods => {
            show_periods();
            Ok(0)
        }
        Commands::Ttl { path } => {
            println!("{}", cache_ttl(&path, Utc::now()).header_value());
            Ok(0)
        }
    }
}

fn generate(
    mut settings: Settings,
    reference_date: Option<String>,
    periods: Vec<String>,
    parallel: bool,
) -> Result<i32> {
    let reference = match reference_date {
        Some(s) => parse_date(&s)?,
        None => today_utc(),
    };
    if !periods.is_empty() {
        select_periods(periods.as_slice())?;
        settings.periods = Some(periods);
    }
    settings.parallel |= parallel;

    let engine = HistoryEngine::new(settings)?;
    let report = engine
        .run_at(reference)
        .context("history generation aborted")?;
    print_report(&report);

    Ok(if report.has_failures() { 1 } else { 0 })
}

fn print_report(report: &RunReport) {
    println!(
        "{} {} ({} snapshot files indexed)",
        "History as of".cyan().bold(),
        report.reference_date,
        report.indexed_files
    );
    for period in &report.periods {
        let status = match &period.outcome {
            PeriodOutcome::Written { path, points } => format!(
                "{} {} ({} points)",
                "written".green(),
                path.display(),
                points
            ),
            PeriodOutcome::Unchanged { path, points } => format!(
                "{} {} ({} points)",
                "unchanged".dimmed(),
                path.display(),
                points
            ),
            PeriodOutcome::Skipped(reason) => format!("{} {}", "skipped".yellow(), reason),
            PeriodOutcome::Failed { error } => format!("{} {}", "failed".red().bold(), error),
        };
        println!("  {:<8} {}", period.period.bold(), status);
        for warning in &period.warnings {
            println!("           {} {}", "warning:".yellow(), warning);
        }
    }
}

fn record(settings: &Settings, file: PathBuf, date: Option<String>) -> Result<i32> {
    let date = match date {
        Some(s) => parse_date(&s)?,
        None => today_utc(),
    };
    let raw = fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let outcome = record_snapshot(&raw, settings, date)?;

    for (path, changed) in [
        (&outcome.latest_path, outcome.latest_changed),
        (&outcome.daily_path, outcome.daily_changed),
    ] {
        print_write_status(path, changed);
    }
    Ok(0)
}

fn print_write_status(path: &Path, changed: bool) {
    let status = if changed {
        "written".green()
    } else {
        "unchanged".dimmed()
    };
    println!("  {} {}", status, path.display());
}

fn show_periods() {
    println!("{}", "Periods".cyan().bold());
    for period in default_periods() {
        println!(
            "  {:<8} {:>5} days  {}  {}",
            period.id.bold(),
            period.lookback_days,
            period.rule,
            history_artifact_path(&period).dimmed()
        );
    }
}

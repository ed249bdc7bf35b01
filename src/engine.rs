//! History generation engine
//!
//! One run builds the snapshot index once and then produces every configured
//! period independently: sample, aggregate, serialize, write if changed.
//! Periods share nothing but the read-only index, so they can run on the
//! rayon pool. The report always lists them in table order.

use crate::calendar::today_utc;
use crate::config::Settings;
use crate::data::{DirectorySnapshotReader, FileIndex, SnapshotReader};
use crate::error::{HistoryError, Result};
use crate::retention::{sample, AggregationWarning, Aggregator, PeriodConfig, Sample};
use crate::writer::write_if_changed;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;

/// Why a period produced no artifact this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No snapshot falls inside the lookback window
    NoFilesInWindow { lookback_days: u32 },
    /// The window had files but the rule selected none
    NoFilesSelected,
    /// Selected files yielded no numeric rate
    NoRates,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoFilesInWindow { lookback_days } => {
                write!(f, "no data files within the last {} days", lookback_days)
            }
            SkipReason::NoFilesSelected => write!(f, "no files selected after sampling"),
            SkipReason::NoRates => write!(f, "no valid rates extracted"),
        }
    }
}

/// What happened to one period's artifact
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodOutcome {
    Written { path: PathBuf, points: usize },
    Unchanged { path: PathBuf, points: usize },
    Skipped(SkipReason),
    Failed { error: String },
}

impl PeriodOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, PeriodOutcome::Written { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PeriodOutcome::Failed { .. })
    }
}

/// Per-period result of a run
#[derive(Debug, Clone)]
pub struct PeriodReport {
    pub period: String,
    /// Entries chosen by the sampling rule
    pub sampled: usize,
    pub outcome: PeriodOutcome,
    pub warnings: Vec<AggregationWarning>,
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub reference_date: NaiveDate,
    pub indexed_files: usize,
    pub periods: Vec<PeriodReport>,
}

impl RunReport {
    /// Periods whose artifact bytes changed on disk
    pub fn changed_count(&self) -> usize {
        self.periods.iter().filter(|p| p.outcome.is_changed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.periods.iter().filter(|p| p.outcome.is_failed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.periods
            .iter()
            .filter(|p| matches!(p.outcome, PeriodOutcome::Skipped(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    pub fn warning_count(&self) -> usize {
        self.periods.iter().map(|p| p.warnings.len()).sum()
    }

    pub fn period(&self, id: &str) -> Option<&PeriodReport> {
        self.periods.iter().find(|p| p.period == id)
    }
}

/// Downsampled history generator
pub struct HistoryEngine {
    settings: Settings,
    periods: Vec<PeriodConfig>,
}

impl HistoryEngine {
    /// Create an engine for the periods selected in `settings`
    pub fn new(settings: Settings) -> Result<Self> {
        let periods = settings.resolve_periods()?;
        Ok(Self { settings, periods })
    }

    /// Create an engine with an explicit period list
    pub fn with_periods(settings: Settings, periods: Vec<PeriodConfig>) -> Self {
        Self { settings, periods }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn periods(&self) -> &[PeriodConfig] {
        &self.periods
    }

    /// Run against today's UTC date
    pub fn run(&self) -> Result<RunReport> {
        self.run_at(today_utc())
    }

    /// Run against the snapshot store with `reference` as the window end.
    ///
    /// Only an unreadable store fails the run; everything else is reported
    /// per period.
    pub fn run_at(&self, reference: NaiveDate) -> Result<RunReport> {
        log::info!("Starting history generation for {}", reference);
        let index = FileIndex::build(&self.settings.data_dir)?;
        let reader = DirectorySnapshotReader::new(&self.settings.data_dir);
        let report = self.run_with(&index, &reader, reference);
        log::info!(
            "History generation finished: {} written, {} skipped, {} failed",
            report.changed_count(),
            report.skipped_count(),
            report.failed_count()
        );
        Ok(report)
    }

    /// Run over an already built index and reader
    pub fn run_with(
        &self,
        index: &FileIndex,
        reader: &dyn SnapshotReader,
        reference: NaiveDate,
    ) -> RunReport {
        if index.is_empty() {
            log::info!("No valid daily data files found, nothing to generate");
        }

        let periods = if self.settings.parallel {
            self.periods
                .par_iter()
                .map(|p| self.process_period(p, index, reader, reference))
                .collect()
        } else {
            self.periods
                .iter()
                .map(|p| self.process_period(p, index, reader, reference))
                .collect()
        };

        RunReport {
            reference_date: reference,
            indexed_files: index.len(),
            periods,
        }
    }

    fn process_period(
        &self,
        period: &PeriodConfig,
        index: &FileIndex,
        reader: &dyn SnapshotReader,
        reference: NaiveDate,
    ) -> PeriodReport {
        let skipped = |sampled: usize, reason: SkipReason, warnings: Vec<AggregationWarning>| {
            log::warn!("[{}] {}, skipping", period.id, reason);
            PeriodReport {
                period: period.id.clone(),
                sampled,
                outcome: PeriodOutcome::Skipped(reason),
                warnings,
            }
        };

        let Sample {
            window_len,
            selected,
        } = sample(index, period.lookback_days, &period.rule, reference);
        if window_len == 0 {
            return skipped(
                0,
                SkipReason::NoFilesInWindow {
                    lookback_days: period.lookback_days,
                },
                Vec::new(),
            );
        }
        if selected.is_empty() {
            return skipped(0, SkipReason::NoFilesSelected, Vec::new());
        }

        let aggregation = Aggregator::new(reader, self.settings.fallback_base.as_str())
            .with_parallel_reads(self.settings.parallel)
            .aggregate(&selected);

        let artifact = match aggregation.artifact {
            Some(artifact) => artifact,
            None => return skipped(selected.len(), SkipReason::NoRates, aggregation.warnings),
        };
        let points = artifact.total_points();
        let path = self.settings.history_dir.join(period.artifact_file_name());

        let outcome = match artifact
            .to_json_bytes()
            .map_err(HistoryError::from)
            .and_then(|bytes| write_if_changed(&path, &bytes))
        {
            Ok(true) => PeriodOutcome::Written { path, points },
            Ok(false) => PeriodOutcome::Unchanged { path, points },
            Err(e) => {
                log::error!("[{}] {}", period.id, e);
                PeriodOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        log::info!(
            "[{}] {} files sampled, {} currencies, {} points",
            period.id,
            selected.len(),
            artifact.currency_count(),
            points
        );

        PeriodReport {
            period: period.id.clone(),
            sampled: selected.len(),
            outcome,
            warnings: aggregation.warnings,
        }
    }
}

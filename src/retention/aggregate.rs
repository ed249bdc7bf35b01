//! Aggregation of sampled snapshots into a history artifact
//!
//! Aggregation is a reduction over read results in ascending date order.
//! Reads may run on the rayon pool; the ordered collect keeps the merge in
//! date order no matter which read finishes first.

use crate::calendar::date_to_epoch_seconds;
use crate::data::{FileIndexEntry, SnapshotReader};
use crate::error::Result;
use crate::types::{CurrencyCode, DailySnapshot, EpochSeconds, HistoryArtifact, RatePoint};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// A sampled file that did not contribute to the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationWarning {
    pub filename: String,
    pub reason: String,
}

impl fmt::Display for AggregationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.reason)
    }
}

/// Result of aggregating one period's sample
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// `None` when no snapshot yielded a single rate
    pub artifact: Option<HistoryArtifact>,
    pub warnings: Vec<AggregationWarning>,
    /// Snapshots that were read and parsed
    pub files_used: usize,
}

/// Running state of the reduction
#[derive(Debug, Default)]
struct HistoryAccumulator {
    timestamp: EpochSeconds,
    base: Option<CurrencyCode>,
    rates: BTreeMap<CurrencyCode, Vec<RatePoint>>,
}

impl HistoryAccumulator {
    fn add_snapshot(&mut self, snapshot: DailySnapshot) {
        if self.base.is_none() {
            self.base = snapshot.base;
        }

        let timestamp = snapshot
            .timestamp
            .unwrap_or_else(|| date_to_epoch_seconds(snapshot.date));
        self.timestamp = self.timestamp.max(timestamp);

        for (code, rate) in snapshot.rates {
            self.rates.entry(code).or_default().push(RatePoint {
                date: snapshot.date,
                rate,
            });
        }
    }

    fn build(self, fallback_base: &str) -> Option<HistoryArtifact> {
        if self.rates.is_empty() {
            return None;
        }
        Some(HistoryArtifact {
            timestamp: self.timestamp,
            base: self.base.unwrap_or_else(|| fallback_base.to_string()),
            rates: self.rates,
        })
    }
}

/// Merges sampled snapshots into a `HistoryArtifact`
pub struct Aggregator<'r> {
    reader: &'r dyn SnapshotReader,
    fallback_base: String,
    parallel_reads: bool,
}

impl<'r> Aggregator<'r> {
    pub fn new(reader: &'r dyn SnapshotReader, fallback_base: impl Into<String>) -> Self {
        Self {
            reader,
            fallback_base: fallback_base.into(),
            parallel_reads: false,
        }
    }

    /// Read snapshots on the rayon pool before merging
    pub fn with_parallel_reads(mut self, parallel: bool) -> Self {
        self.parallel_reads = parallel;
        self
    }

    /// Aggregate entries in the order given.
    ///
    /// Entries are expected in ascending date order with unique dates, as a
    /// `FileIndex` and the sampling rules produce them. Points are appended in
    /// input order, so other input yields series in that same order.
    ///
    /// A file that cannot be read or parsed becomes a warning and the rest of
    /// the sample still contributes.
    pub fn aggregate(&self, entries: &[FileIndexEntry]) -> Aggregation {
        let reads: Vec<Result<DailySnapshot>> = if self.parallel_reads {
            entries.par_iter().map(|e| self.reader.read(e)).collect()
        } else {
            entries.iter().map(|e| self.reader.read(e)).collect()
        };

        let mut acc = HistoryAccumulator::default();
        let mut warnings = Vec::new();
        let mut files_used = 0;

        for (entry, read) in entries.iter().zip(reads) {
            match read {
                Ok(snapshot) => {
                    if snapshot.skipped_rates > 0 {
                        log::debug!(
                            "Ignored {} non-numeric rates in {}",
                            snapshot.skipped_rates,
                            entry.filename
                        );
                    }
                    acc.add_snapshot(snapshot);
                    files_used += 1;
                }
                Err(e) => {
                    log::warn!("Failed to read/parse {}: {}", entry.filename, e);
                    warnings.push(AggregationWarning {
                        filename: entry.filename.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Aggregation {
            artifact: acc.build(&self.fallback_base),
            warnings,
            files_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemorySnapshotReader;
    use crate::types::DEFAULT_BASE_CURRENCY;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn entry(y: i32, m: u32, d: u32) -> FileIndexEntry {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        FileIndexEntry::new(format!("{}.json", date.format("%Y-%m-%d")), date)
    }

    fn reader(bodies: &[(&str, &str)]) -> InMemorySnapshotReader {
        let mut reader = InMemorySnapshotReader::new();
        for (name, body) in bodies {
            reader.insert(*name, *body);
        }
        reader
    }

    #[test]
    fn test_points_are_chronological_per_currency() {
        let reader = reader(&[
            ("2024-01-01.json", r#"{"timestamp":100,"base":"USD","rates":{"EUR":0.90}}"#),
            ("2024-01-02.json", r#"{"timestamp":200,"base":"USD","rates":{"EUR":0.91,"GBP":0.79}}"#),
            ("2024-01-03.json", r#"{"timestamp":300,"base":"USD","rates":{"EUR":0.92}}"#),
        ]);
        let entries = vec![entry(2024, 1, 1), entry(2024, 1, 2), entry(2024, 1, 3)];

        let result = Aggregator::new(&reader, DEFAULT_BASE_CURRENCY).aggregate(&entries);
        let artifact = result.artifact.unwrap();

        assert_eq!(artifact.timestamp, 300);
        assert_eq!(artifact.base, "USD");
        let eur = &artifact.rates["EUR"];
        assert_eq!(eur.len(), 3);
        assert!(eur.windows(2).all(|w| w[0].date < w[1].date));
        assert_relative_eq!(eur[2].rate, 0.92);
        assert_eq!(artifact.rates["GBP"].len(), 1);
        assert_eq!(result.files_used, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_first_base_wins_and_timestamp_is_max() {
        let reader = reader(&[
            ("2024-01-01.json", r#"{"timestamp":500,"rates":{"EUR":0.90}}"#),
            ("2024-01-02.json", r#"{"timestamp":900,"base":"EUR","rates":{"USD":1.1}}"#),
            ("2024-01-03.json", r#"{"timestamp":700,"base":"GBP","rates":{"USD":1.3}}"#),
        ]);
        let entries = vec![entry(2024, 1, 1), entry(2024, 1, 2), entry(2024, 1, 3)];

        let artifact = Aggregator::new(&reader, "USD").aggregate(&entries).artifact.unwrap();
        assert_eq!(artifact.base, "EUR");
        assert_eq!(artifact.timestamp, 900);
    }

    #[test]
    fn test_missing_timestamp_uses_file_date() {
        let reader = reader(&[("2024-01-01.json", r#"{"rates":{"EUR":0.90}}"#)]);
        let artifact = Aggregator::new(&reader, "USD")
            .aggregate(&[entry(2024, 1, 1)])
            .artifact
            .unwrap();
        assert_eq!(artifact.timestamp, 1_704_067_200);
        assert_eq!(artifact.base, "USD");
    }

    #[test]
    fn test_corrupt_file_is_skipped_with_warning() {
        let reader = reader(&[
            ("2024-01-01.json", r#"{"timestamp":1,"base":"USD","rates":{"EUR":0.90}}"#),
            ("2024-01-02.json", r#"{"timestamp":2,"base":"USD","rates":{"EUR""#),
            ("2024-01-03.json", r#"{"timestamp":3,"base":"USD","rates":{"EUR":0.92}}"#),
        ]);
        let entries = vec![entry(2024, 1, 1), entry(2024, 1, 2), entry(2024, 1, 3)];

        for parallel in [false, true] {
            let result = Aggregator::new(&reader, "USD")
                .with_parallel_reads(parallel)
                .aggregate(&entries);
            assert_eq!(result.warnings.len(), 1);
            assert_eq!(result.warnings[0].filename, "2024-01-02.json");
            assert_eq!(result.files_used, 2);
            assert_eq!(result.artifact.unwrap().rates["EUR"].len(), 2);
        }
    }

    #[test]
    fn test_no_rates_means_no_artifact() {
        let reader = reader(&[
            ("2024-01-01.json", r#"{"timestamp":1,"base":"USD","rates":{}}"#),
            ("2024-01-02.json", r#"{"timestamp":2,"base":"USD","rates":{"EUR":"n/a"}}"#),
        ]);
        let result = Aggregator::new(&reader, "USD").aggregate(&[entry(2024, 1, 1), entry(2024, 1, 2)]);
        assert!(result.artifact.is_none());
        assert_eq!(result.files_used, 2);
    }

    #[test]
    fn test_repeated_dates_follow_input_order() {
        let reader = reader(&[
            ("2024-01-01.json", r#"{"timestamp":1,"base":"USD","rates":{"EUR":0.90}}"#),
            ("copy.json", r#"{"timestamp":1,"base":"USD","rates":{"EUR":0.95}}"#),
        ]);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = vec![entry(2024, 1, 1), FileIndexEntry::new("copy.json", date)];

        let artifact = Aggregator::new(&reader, "USD").aggregate(&entries).artifact.unwrap();
        let eur = &artifact.rates["EUR"];
        assert_eq!(eur.len(), 2);
        assert_relative_eq!(eur[0].rate, 0.90);
        assert_relative_eq!(eur[1].rate, 0.95);
    }
}

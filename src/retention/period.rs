//! Period policy table
//!
//! Each period names a chart zoom level, how far back it looks and how it
//! thins the daily archive. The ids and numbers are consumed by clients and
//! the edge cache, so they must not drift.

use super::sampling::SamplingRule;
use crate::error::{HistoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Period ids in table order
pub const PERIOD_IDS: [&str; 6] = ["week", "month", "6-month", "year", "2-year", "5-year"];

/// Retention policy for one downsampled artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub id: String,
    pub lookback_days: u32,
    pub rule: SamplingRule,
}

impl PeriodConfig {
    pub fn new(id: impl Into<String>, lookback_days: u32, rule: SamplingRule) -> Self {
        Self {
            id: id.into(),
            lookback_days,
            rule,
        }
    }

    /// Artifact file name, `<id>.json`
    pub fn artifact_file_name(&self) -> String {
        format!("{}.json", self.id)
    }
}

impl fmt::Display for PeriodConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} days, {})", self.id, self.lookback_days, self.rule)
    }
}

fn days(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

/// The six published periods, in table order
pub fn default_periods() -> Vec<PeriodConfig> {
    vec![
        PeriodConfig::new("week", 7, SamplingRule::Gap(1)),
        PeriodConfig::new("month", 31, SamplingRule::Gap(2)),
        PeriodConfig::new("6-month", 183, SamplingRule::DaysOfMonth(days(&[1, 11, 21]))),
        PeriodConfig::new("year", 366, SamplingRule::DaysOfMonth(days(&[1, 15]))),
        PeriodConfig::new("2-year", 731, SamplingRule::DayOfMonthOnOrAfter(1)),
        PeriodConfig::new("5-year", 1826, SamplingRule::FirstDayOfNthMonth(3)),
    ]
}

/// Look up a published period by id
pub fn find_period(id: &str) -> Result<PeriodConfig> {
    default_periods()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| HistoryError::UnknownPeriod(id.to_string()))
}

/// Resolve a list of ids into periods, keeping table order and dropping repeats
pub fn select_periods<S: AsRef<str>>(ids: &[S]) -> Result<Vec<PeriodConfig>> {
    for id in ids {
        find_period(id.as_ref())?;
    }
    Ok(default_periods()
        .into_iter()
        .filter(|p| ids.iter().any(|id| id.as_ref() == p.id))
        .collect())
}

//! Sampling rules
//!
//! Sampling runs in two steps: a lookback window cut over the ascending
//! index, then a rule that thins the window. Every bucketed rule keeps the
//! earliest entry of its bucket, so the ascending order of the index is
//! what makes "first wins" mean "earliest wins".

use crate::calendar::{lookback_cutoff, month_index, MonthKey};
use crate::data::{FileIndex, FileIndexEntry};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;

/// How a period thins its lookback window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum SamplingRule {
    /// Every n-th entry, counted from the oldest entry in the window
    Gap(usize),
    /// Entries whose day of month is one of the targets
    DaysOfMonth(BTreeSet<u32>),
    /// Earliest entry per month with a day of month at or after the threshold
    DayOfMonthOnOrAfter(u32),
    /// Earliest entry of every n-th month, with January as month 0
    FirstDayOfNthMonth(u32),
}

impl SamplingRule {
    /// Apply the rule to an ascending run of entries
    pub fn select(&self, entries: &[FileIndexEntry]) -> Vec<FileIndexEntry> {
        match self {
            SamplingRule::Gap(n) => {
                let stride = (*n).max(1);
                entries.iter().step_by(stride).cloned().collect()
            }
            SamplingRule::DaysOfMonth(targets) => first_per_bucket(entries, |date| {
                targets.contains(&date.day()).then_some(date)
            }),
            SamplingRule::DayOfMonthOnOrAfter(day) => first_per_bucket(entries, |date| {
                (date.day() >= *day).then(|| MonthKey::of(date))
            }),
            SamplingRule::FirstDayOfNthMonth(gap) => {
                let gap = (*gap).max(1);
                first_per_bucket(entries, |date| {
                    (month_index(date) % gap == 0).then(|| MonthKey::of(date))
                })
            }
        }
    }
}

impl fmt::Display for SamplingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingRule::Gap(n) => write!(f, "every {} entr{}", n, if *n == 1 { "y" } else { "ies" }),
            SamplingRule::DaysOfMonth(days) => {
                let days: Vec<String> = days.iter().map(u32::to_string).collect();
                write!(f, "days {} of each month", days.join(", "))
            }
            SamplingRule::DayOfMonthOnOrAfter(day) => {
                write!(f, "first entry on or after day {} of each month", day)
            }
            SamplingRule::FirstDayOfNthMonth(gap) => {
                write!(f, "first entry of every {} month(s) from January", gap)
            }
        }
    }
}

/// Keep the first entry for each bucket key; entries mapped to `None` are dropped
fn first_per_bucket<K, F>(entries: &[FileIndexEntry], bucket: F) -> Vec<FileIndexEntry>
where
    K: Eq + Hash,
    F: Fn(NaiveDate) -> Option<K>,
{
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| bucket(entry.date).map_or(false, |key| seen.insert(key)))
        .cloned()
        .collect()
}

/// Entries of `index` inside a window of `lookback_days` ending on `reference`.
///
/// The index is ascending, so the window is a suffix of it.
pub fn lookback_window(index: &FileIndex, lookback_days: u32, reference: NaiveDate) -> &[FileIndexEntry] {
    let cutoff = lookback_cutoff(reference, lookback_days);
    let entries = index.entries();
    let start = entries.partition_point(|e| e.date <= cutoff);
    &entries[start..]
}

/// Entries a period contributes, with the size of the window they came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    /// Entries inside the lookback window before the rule applied
    pub window_len: usize,
    pub selected: Vec<FileIndexEntry>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Select the entries a period contributes to its artifact.
///
/// An empty selection means the period has nothing to publish for this run;
/// `window_len` tells an empty window apart from a rule that matched nothing.
pub fn sample(
    index: &FileIndex,
    lookback_days: u32,
    rule: &SamplingRule,
    reference: NaiveDate,
) -> Sample {
    let window = lookback_window(index, lookback_days, reference);
    if window.is_empty() {
        return Sample::default();
    }
    let selected = rule.select(window);
    log::debug!(
        "{} of {} entries in the last {} days selected by {}",
        selected.len(),
        window.len(),
        lookback_days,
        rule
    );
    Sample {
        window_len: window.len(),
        selected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::snapshot_filename;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate, end: NaiveDate) -> Vec<FileIndexEntry> {
        let mut out = Vec::new();
        let mut current = start;
        while current <= end {
            out.push(FileIndexEntry::new(snapshot_filename(current), current));
            current += Duration::days(1);
        }
        out
    }

    fn dates(entries: &[FileIndexEntry]) -> Vec<NaiveDate> {
        entries.iter().map(|e| e.date).collect()
    }

    #[test]
    fn test_window_is_exactly_lookback_days() {
        let index = FileIndex::from_entries(daily(date(2024, 1, 1), date(2024, 1, 10)));
        let window = lookback_window(&index, 7, date(2024, 1, 10));
        assert_eq!(window.len(), 7);
        assert_eq!(window[0].date, date(2024, 1, 4));
        assert_eq!(window[6].date, date(2024, 1, 10));
    }

    #[test]
    fn test_window_empty_when_archive_is_stale() {
        let index = FileIndex::from_entries(daily(date(2023, 1, 1), date(2023, 1, 31)));
        let stale = sample(&index, 7, &SamplingRule::Gap(1), date(2024, 1, 10));
        assert!(stale.is_empty());
        assert_eq!(stale.window_len, 0);
    }

    #[test]
    fn test_gap_positions() {
        let entries = daily(date(2024, 1, 1), date(2024, 1, 10));
        let picked = SamplingRule::Gap(3).select(&entries);
        assert_eq!(
            dates(&picked),
            vec![date(2024, 1, 1), date(2024, 1, 4), date(2024, 1, 7), date(2024, 1, 10)]
        );
        assert_eq!(SamplingRule::Gap(1).select(&entries).len(), 10);
        assert_eq!(SamplingRule::Gap(0).select(&entries).len(), 10);
    }

    #[test]
    fn test_gap_anchors_to_oldest_entry_in_window() {
        let index = FileIndex::from_entries(daily(date(2024, 1, 1), date(2024, 2, 29)));
        let monday = sample(&index, 31, &SamplingRule::Gap(2), date(2024, 2, 28));
        let tuesday = sample(&index, 31, &SamplingRule::Gap(2), date(2024, 2, 29));
        assert_eq!(monday.window_len, 31);
        assert_eq!(monday.selected[0].date, date(2024, 1, 29));
        assert_eq!(tuesday.selected[0].date, date(2024, 1, 30));
    }

    #[test]
    fn test_days_of_month_full_year() {
        let entries = daily(date(2023, 1, 1), date(2023, 12, 31));
        let rule = SamplingRule::DaysOfMonth([1, 15].into_iter().collect());
        let picked = rule.select(&entries);
        assert_eq!(picked.len(), 24);
        assert!(picked.iter().all(|e| e.date.day() == 1 || e.date.day() == 15));
    }

    #[test]
    fn test_days_of_month_ignores_duplicate_dates() {
        let mut entries = daily(date(2024, 1, 1), date(2024, 1, 2));
        entries.insert(1, FileIndexEntry::new("copy", date(2024, 1, 1)));
        let rule = SamplingRule::DaysOfMonth([1].into_iter().collect());
        let picked = rule.select(&entries);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].filename, "2024-01-01.json");
    }

    #[test]
    fn test_day_of_month_on_or_after_full_year() {
        let entries = daily(date(2023, 1, 1), date(2023, 12, 31));
        let picked = SamplingRule::DayOfMonthOnOrAfter(1).select(&entries);
        assert_eq!(picked.len(), 12);
        assert!(picked.iter().all(|e| e.date.day() == 1));
    }

    #[test]
    fn test_day_of_month_on_or_after_falls_through_to_next_file() {
        let mut entries = daily(date(2024, 1, 3), date(2024, 1, 31));
        entries.extend(daily(date(2024, 2, 1), date(2024, 2, 10)));
        let picked = SamplingRule::DayOfMonthOnOrAfter(1).select(&entries);
        assert_eq!(dates(&picked), vec![date(2024, 1, 3), date(2024, 2, 1)]);

        let picked = SamplingRule::DayOfMonthOnOrAfter(15).select(&entries);
        assert_eq!(dates(&picked), vec![date(2024, 1, 15)]);
    }

    #[test]
    fn test_first_day_of_nth_month_two_years() {
        let entries = daily(date(2022, 1, 1), date(2023, 12, 31));
        let picked = SamplingRule::FirstDayOfNthMonth(3).select(&entries);
        assert_eq!(
            dates(&picked),
            vec![
                date(2022, 1, 1),
                date(2022, 4, 1),
                date(2022, 7, 1),
                date(2022, 10, 1),
                date(2023, 1, 1),
                date(2023, 4, 1),
                date(2023, 7, 1),
                date(2023, 10, 1),
            ]
        );
    }

    #[test]
    fn test_first_day_of_nth_month_skips_non_qualifying_months() {
        // February and March never qualify for a 3-month cycle
        let entries = daily(date(2024, 2, 10), date(2024, 4, 5));
        let picked = SamplingRule::FirstDayOfNthMonth(3).select(&entries);
        assert_eq!(dates(&picked), vec![date(2024, 4, 1)]);
    }

    #[test]
    fn test_rule_serde_shape() {
        let json = serde_json::to_string(&SamplingRule::Gap(2)).unwrap();
        assert_eq!(json, r#"{"type":"gap","value":2}"#);
        let rule: SamplingRule =
            serde_json::from_str(r#"{"type":"days-of-month","value":[1,15]}"#).unwrap();
        assert_eq!(rule, SamplingRule::DaysOfMonth([1, 15].into_iter().collect()));
    }
}

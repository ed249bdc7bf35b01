//! Absolute-day UTC calendar helpers
//!
//! Snapshot files are keyed by calendar day only. Every date in the crate is a
//! `NaiveDate` interpreted as a UTC day, so there is no timezone handling here.

use crate::error::{HistoryError, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Date format used in snapshot filenames and artifact points
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Extension carried by every snapshot file
pub const SNAPSHOT_EXTENSION: &str = ".json";

/// Why a filename was not accepted as a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameRejection {
    /// Does not look like `YYYY-MM-DD.json` at all
    Pattern,
    /// Looks right but names a day that does not exist (e.g. `2021-02-30`)
    ImpossibleDate,
}

/// Parse a snapshot filename of the exact form `YYYY-MM-DD.json`.
///
/// The whole name must match; `2024-01-01.json.bak` or `x2024-01-01.json`
/// are rejected. The numeric parts must round-trip through a real calendar
/// date.
pub fn parse_snapshot_filename(filename: &str) -> std::result::Result<NaiveDate, FilenameRejection> {
    let stem = filename
        .strip_suffix(SNAPSHOT_EXTENSION)
        .ok_or(FilenameRejection::Pattern)?;
    let (year, month, day) = split_ymd(stem).ok_or(FilenameRejection::Pattern)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(FilenameRejection::ImpossibleDate)?;
    if date.year() != year || date.month() != month || date.day() != day {
        return Err(FilenameRejection::ImpossibleDate);
    }
    Ok(date)
}

/// Split `YYYY-MM-DD` into numeric parts; ASCII digits only
fn split_ymd(s: &str) -> Option<(i32, u32, u32)> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[5..7].parse().ok()?;
    let day = s[8..10].parse().ok()?;
    Some((year, month, day))
}

/// Parse a user-supplied `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| HistoryError::InvalidDate(format!("{}: {}", s, e)))
}

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Filename a snapshot for `date` is stored under
pub fn snapshot_filename(date: NaiveDate) -> String {
    format!("{}{}", format_date(date), SNAPSHOT_EXTENSION)
}

/// Seconds since the Unix epoch at midnight UTC of `date`
pub fn date_to_epoch_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Zero-based month index (January = 0)
pub fn month_index(date: NaiveDate) -> u32 {
    date.month0()
}

/// Calendar month bucket a date falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Oldest date excluded from a window of `lookback_days` ending on `reference`.
///
/// Entries strictly after the returned date are inside the window, so a
/// 7-day lookback on 2024-01-10 keeps 2024-01-04 through 2024-01-10.
pub fn lookback_cutoff(reference: NaiveDate, lookback_days: u32) -> NaiveDate {
    reference - Duration::days(i64::from(lookback_days))
}

/// Current UTC calendar day
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

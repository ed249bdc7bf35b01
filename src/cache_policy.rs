//! Edge cache lifetimes for published files
//!
//! The delivery layer picks a `Cache-Control` lifetime from the request path
//! alone. History artifacts expire shortly after the daily job is expected to
//! have run (01:00 UTC), dated snapshots other than today's never change, and
//! `latest` is refreshed hourly.

use crate::calendar::format_date;
use crate::retention::PeriodConfig;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

pub const ONE_HOUR: u64 = 3_600;
pub const ONE_YEAR: u64 = 31_536_000;
/// Shortest lifetime handed out for history artifacts
pub const MIN_HISTORY_TTL: u64 = 60;
/// UTC hour after which a new day's artifacts are expected
pub const HISTORY_REFRESH_HOUR: u32 = 1;

/// Which publishing convention a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Latest,
    DailySnapshot { today: bool },
    Currencies,
    History,
    Other,
}

/// Cache lifetime for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub seconds: u64,
    pub immutable: bool,
}

impl CacheTtl {
    fn of(seconds: u64) -> Self {
        Self {
            seconds,
            immutable: seconds >= ONE_YEAR,
        }
    }

    /// `Cache-Control` header value
    pub fn header_value(&self) -> String {
        if self.immutable {
            format!("public, max-age={}, immutable", self.seconds)
        } else {
            format!("public, max-age={}", self.seconds)
        }
    }
}

/// Case-insensitive prefix match on ASCII
fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn ends_with_ci(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.as_bytes()[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix.as_bytes())
}

/// `YYYY-MM-DD` shape check, digits only, no calendar validation
fn is_date_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter()
            .enumerate()
            .all(|(i, c)| if i == 4 || i == 7 { *c == b'-' } else { c.is_ascii_digit() })
}

/// Classify a request path
pub fn classify_path(path: &str, today: NaiveDate) -> PathClass {
    if starts_with_ci(path, "/latest") && matches!(path.as_bytes().get(7).copied(), None | Some(b'/')) {
        return PathClass::Latest;
    }

    if let Some(stamp) = path
        .strip_prefix("/data/")
        .and_then(|rest| rest.strip_suffix(".json"))
        .filter(|stamp| is_date_shaped(stamp))
    {
        return PathClass::DailySnapshot {
            today: stamp == format_date(today),
        };
    }

    if starts_with_ci(path, "/currencies/") {
        return PathClass::Currencies;
    }

    if starts_with_ci(path, "/history/") && ends_with_ci(path, ".json") {
        return PathClass::History;
    }

    PathClass::Other
}

/// Seconds from `now` until 01:00 UTC on the following day, at least 60
pub fn seconds_until_history_refresh(now: DateTime<Utc>) -> u64 {
    let refresh_time = NaiveTime::from_hms_opt(HISTORY_REFRESH_HOUR, 0, 0).unwrap_or_default();
    let next = (now.date_naive() + Duration::days(1))
        .and_time(refresh_time)
        .and_utc();
    let remaining = (next - now).num_seconds().max(0) as u64;
    remaining.max(MIN_HISTORY_TTL)
}

/// Cache lifetime for `path` requested at `now`
pub fn cache_ttl(path: &str, now: DateTime<Utc>) -> CacheTtl {
    match classify_path(path, now.date_naive()) {
        PathClass::Latest => CacheTtl::of(ONE_HOUR),
        PathClass::DailySnapshot { today: true } => CacheTtl::of(ONE_HOUR),
        PathClass::DailySnapshot { today: false } => CacheTtl::of(ONE_YEAR),
        PathClass::Currencies => CacheTtl::of(ONE_YEAR),
        PathClass::History => CacheTtl::of(seconds_until_history_refresh(now)),
        PathClass::Other => CacheTtl::of(ONE_HOUR),
    }
}

/// Public path a period's artifact is served from
pub fn history_artifact_path(period: &PeriodConfig) -> String {
    format!("/history/{}", period.artifact_file_name())
}

/// Public path of the daily snapshot for `date`
pub fn daily_snapshot_path(date: NaiveDate) -> String {
    format!("/data/{}.json", format_date(date))
}

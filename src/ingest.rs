//! Recording provider snapshots into the store
//!
//! A fetched `latest.json` document is trimmed to `timestamp`, `base` and
//! `rates`, then mirrored to `<latest_dir>/data.json` and filed as
//! `<data_dir>/<date>.json`. The provider's currency name list is filed as
//! `<currencies_dir>/currencies.json`. Every write is content-compared so
//! re-recording the same response touches nothing.

use crate::calendar::snapshot_filename;
use crate::config::Settings;
use crate::error::{HistoryError, Result};
use crate::writer::write_if_changed;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// File the most recent snapshot is mirrored to inside `latest_dir`
pub const LATEST_FILE_NAME: &str = "data.json";

/// File the currency name list is stored as inside `currencies_dir`
pub const CURRENCIES_FILE_NAME: &str = "currencies.json";

/// Which files a recording changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub latest_path: PathBuf,
    pub latest_changed: bool,
    pub daily_path: PathBuf,
    pub daily_changed: bool,
}

#[derive(Serialize)]
struct StoredSnapshot<'a> {
    timestamp: &'a Value,
    base: &'a Value,
    rates: &'a Value,
}

/// Reduce a provider document to the stored snapshot body.
///
/// `timestamp`, `base` and `rates` must all be present; anything else the
/// provider sends (disclaimer, license) is dropped.
pub fn prepare_snapshot(raw: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| HistoryError::InvalidSnapshot(format!("response is not JSON: {}", e)))?;
    let object: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| HistoryError::InvalidSnapshot("response is not a JSON object".to_string()))?;

    let field = |name: &str| {
        object.get(name).ok_or_else(|| {
            HistoryError::InvalidSnapshot(format!("response is missing required field `{}`", name))
        })
    };
    let stored = StoredSnapshot {
        timestamp: field("timestamp")?,
        base: field("base")?,
        rates: field("rates")?,
    };
    if !stored.rates.is_object() {
        return Err(HistoryError::InvalidSnapshot(
            "`rates` must be an object".to_string(),
        ));
    }
    Ok(serde_json::to_vec(&stored)?)
}

/// File a provider document as the snapshot for `date` and as the latest snapshot
pub fn record_snapshot(raw: &[u8], settings: &Settings, date: NaiveDate) -> Result<RecordOutcome> {
    let body = prepare_snapshot(raw)?;

    let latest_path = settings.latest_dir.join(LATEST_FILE_NAME);
    let daily_path = settings.data_dir.join(snapshot_filename(date));

    let latest_changed = write_if_changed(&latest_path, &body)?;
    let daily_changed = write_if_changed(&daily_path, &body)?;
    log::info!(
        "Recorded snapshot for {} (latest {}, daily {})",
        date,
        if latest_changed { "updated" } else { "unchanged" },
        if daily_changed { "updated" } else { "unchanged" }
    );

    Ok(RecordOutcome {
        latest_path,
        latest_changed,
        daily_path,
        daily_changed,
    })
}

/// Validate a provider currency list (`{"USD": "United States Dollar", ...}`)
/// and return its compact body. An empty object is rejected.
pub fn prepare_currency_list(raw: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| HistoryError::InvalidSnapshot(format!("currency list is not JSON: {}", e)))?;
    match value.as_object() {
        Some(names) if !names.is_empty() => Ok(serde_json::to_vec(&value)?),
        Some(_) => Err(HistoryError::InvalidSnapshot(
            "currency list is empty".to_string(),
        )),
        None => Err(HistoryError::InvalidSnapshot(
            "currency list is not a JSON object".to_string(),
        )),
    }
}

/// File a provider currency list; returns the path and whether it changed
pub fn record_currency_list(raw: &[u8], settings: &Settings) -> Result<(PathBuf, bool)> {
    let body = prepare_currency_list(raw)?;
    let path = settings.currencies_dir.join(CURRENCIES_FILE_NAME);
    let changed = write_if_changed(&path, &body)?;
    log::info!(
        "Recorded currency list ({})",
        if changed { "updated" } else { "unchanged" }
    );
    Ok((path, changed))
}

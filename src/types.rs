//! Core types and constants

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// ISO 4217-style currency code as published by the rate provider
pub type CurrencyCode = String;

/// Exchange rate relative to the snapshot's base currency
pub type Rate = f64;

/// Unix timestamp in seconds
pub type EpochSeconds = i64;

/// Base currency used when no sampled snapshot declares one
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// One day's exchange-rate data relative to a base currency
#[derive(Debug, Clone, PartialEq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    /// Provider timestamp; `None` when missing, zero or not a number
    pub timestamp: Option<EpochSeconds>,
    pub base: Option<CurrencyCode>,
    pub rates: BTreeMap<CurrencyCode, Rate>,
    /// Rate entries dropped because their value was not numeric
    pub skipped_rates: usize,
}

impl DailySnapshot {
    /// Create a snapshot with every field present
    pub fn new(
        date: NaiveDate,
        timestamp: EpochSeconds,
        base: impl Into<CurrencyCode>,
        rates: BTreeMap<CurrencyCode, Rate>,
    ) -> Self {
        Self {
            date,
            timestamp: Some(timestamp),
            base: Some(base.into()),
            rates,
            skipped_rates: 0,
        }
    }

    /// Parse the body of a `YYYY-MM-DD.json` snapshot file.
    ///
    /// Only a non-object document is a parse failure. Individual fields are
    /// lenient: a missing or malformed `timestamp`/`base` reads as absent and
    /// non-numeric rates are dropped.
    pub fn from_json_slice(date: NaiveDate, bytes: &[u8]) -> std::result::Result<Self, String> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        let object = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, found {}", json_kind(&value)))?;

        let timestamp = object
            .get("timestamp")
            .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(|f| f as i64)))
            .filter(|t| *t != 0);

        let base = object
            .get("base")
            .and_then(Value::as_str)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        let mut rates = BTreeMap::new();
        let mut skipped_rates = 0;
        if let Some(raw) = object.get("rates").and_then(Value::as_object) {
            for (code, rate) in raw {
                match rate.as_f64() {
                    Some(rate) => {
                        rates.insert(code.clone(), rate);
                    }
                    None => skipped_rates += 1,
                }
            }
        }

        Ok(Self {
            date,
            timestamp,
            base,
            rates,
            skipped_rates,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One point of a currency's downsampled series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: Rate,
}

/// Persisted downsampled time series for one period.
///
/// Field order and `BTreeMap` key order make the serialized form
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryArtifact {
    /// Latest timestamp among contributing snapshots
    pub timestamp: EpochSeconds,
    pub base: CurrencyCode,
    pub rates: BTreeMap<CurrencyCode, Vec<RatePoint>>,
}

impl HistoryArtifact {
    /// Compact JSON bytes, stable across runs for equal artifacts
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Number of points recorded for each currency
    pub fn points_per_currency(&self) -> BTreeMap<&str, usize> {
        self.rates
            .iter()
            .map(|(code, points)| (code.as_str(), points.len()))
            .collect()
    }

    /// Total points across all currencies
    pub fn total_points(&self) -> usize {
        self.rates.values().map(Vec::len).sum()
    }

    /// Number of currencies with at least one point
    pub fn currency_count(&self) -> usize {
        self.rates.len()
    }
}

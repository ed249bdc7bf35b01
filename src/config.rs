//! Settings loaded from TOML
//!
//! ```toml
//! data_dir = "./data"
//! history_dir = "./history"
//! latest_dir = "./latest"
//! currencies_dir = "./currencies"
//! fallback_base = "USD"
//! parallel = true
//! periods = ["week", "year"]
//! ```

use crate::error::{HistoryError, Result};
use crate::retention::{default_periods, select_periods, PeriodConfig};
use crate::types::DEFAULT_BASE_CURRENCY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "rate-history.toml";

/// Engine and recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Daily snapshot store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where `<period>.json` artifacts are written
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
    /// Where the most recent snapshot is mirrored as `data.json`
    #[serde(default = "default_latest_dir")]
    pub latest_dir: PathBuf,
    /// Where the currency name list is stored as `currencies.json`
    #[serde(default = "default_currencies_dir")]
    pub currencies_dir: PathBuf,
    #[serde(default = "default_fallback_base")]
    pub fallback_base: String,
    /// Run periods and snapshot reads on the rayon pool
    #[serde(default)]
    pub parallel: bool,
    /// Period ids to generate; all periods when absent
    #[serde(default)]
    pub periods: Option<Vec<String>>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("./history")
}

fn default_latest_dir() -> PathBuf {
    PathBuf::from("./latest")
}

fn default_currencies_dir() -> PathBuf {
    PathBuf::from("./currencies")
}

fn default_fallback_base() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            history_dir: default_history_dir(),
            latest_dir: default_latest_dir(),
            currencies_dir: default_currencies_dir(),
            fallback_base: default_fallback_base(),
            parallel: false,
            periods: None,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents)
            .map_err(|e| HistoryError::ConfigError(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, or from the default locations when `None`.
    ///
    /// An explicit path must exist and parse. Without one, `./rate-history.toml`
    /// and then `~/.rate-history/config.toml` are tried before falling back to
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        for candidate in Self::default_locations() {
            if candidate.is_file() {
                log::debug!("Loading settings from {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            HistoryError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            locations.push(home.join(".rate-history").join("config.toml"));
        }
        locations
    }

    fn validate(&self) -> Result<()> {
        if self.fallback_base.trim().is_empty() {
            return Err(HistoryError::ConfigError(
                "fallback_base must not be empty".to_string(),
            ));
        }
        self.resolve_periods()
            .map_err(|e| HistoryError::ConfigError(e.to_string()))?;
        Ok(())
    }

    /// The periods this run generates, in table order
    pub fn resolve_periods(&self) -> Result<Vec<PeriodConfig>> {
        match &self.periods {
            Some(ids) => select_periods(ids.as_slice()),
            None => Ok(default_periods()),
        }
    }
}

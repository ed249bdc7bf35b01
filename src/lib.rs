//! # rate-history
//!
//! Builds downsampled exchange-rate history artifacts from a rolling archive
//! of daily snapshots.
//!
//! The snapshot store is a directory of `YYYY-MM-DD.json` files. Each run
//! indexes it, picks a subset of days for every chart period (week through
//! five years), merges those snapshots into one per-currency series and
//! writes `<period>.json` only when its bytes change.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rate_history::prelude::*;
//!
//! let settings = Settings::load(None)?;
//! let engine = HistoryEngine::new(settings)?;
//! let report = engine.run()?;
//! println!("{} artifacts changed", report.changed_count());
//! # Ok::<(), rate_history::error::HistoryError>(())
//! ```

pub mod cache_policy;
pub mod calendar;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod retention;
pub mod types;
pub mod writer;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::Settings;
    pub use crate::data::{FileIndex, FileIndexEntry, SnapshotReader};
    pub use crate::engine::{HistoryEngine, PeriodOutcome, RunReport};
    pub use crate::error::{HistoryError, Result};
    pub use crate::retention::{default_periods, PeriodConfig, SamplingRule};
    pub use crate::types::*;
}

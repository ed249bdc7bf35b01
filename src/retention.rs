//! Retention and downsampling
//!
//! - **period**: the published period table
//! - **sampling**: lookback window and sampling rules
//! - **aggregate**: merge of sampled snapshots into one artifact

pub mod aggregate;
pub mod period;
pub mod sampling;

pub use aggregate::{Aggregation, AggregationWarning, Aggregator};
pub use period::{default_periods, find_period, select_periods, PeriodConfig, PERIOD_IDS};
pub use sampling::{lookback_window, sample, Sample, SamplingRule};

//! # velostat
//!
//! Exploratory analysis and anomaly correction for bicycle-counter
//! time series.
//!
//! The pipeline loads a daily count table, derives holiday/weekend
//! indicator columns, patches zero-count sensor gaps, and runs a
//! rolling seasonal-trend decomposition that flags and rewrites
//! observations falling outside a 99.7% prediction interval. Results
//! are persisted as per-counter binary snapshots and aggregated for a
//! dashboard layer; a read-only accessor fetches companion weather
//! data from PostgreSQL.

pub mod calendar;
pub mod core;
pub mod correct;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod io;
pub mod models;
pub mod seasonal;
pub mod transform;
pub mod utils;

pub use error::{Result, VeloError};

pub mod prelude {
    pub use crate::calendar::{append_indicators, HolidayCalendar};
    pub use crate::core::{AnomalyRecord, CounterFrame};
    pub use crate::correct::{RollingDriver, RollingOptions, RollingOutcome};
    pub use crate::error::{Result, VeloError};
    pub use crate::models::{MstlForecaster, TrendMethod};
    pub use crate::transform::fill_zero_gaps;
}

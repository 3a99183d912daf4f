//! Core data structures: the daily counter frame and anomaly records.

mod anomaly;
mod frame;

pub use anomaly::AnomalyRecord;
pub use frame::{CounterFrame, COUNT_PREFIX};

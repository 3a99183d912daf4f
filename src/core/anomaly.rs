//! Anomaly records produced by the correction step.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One out-of-interval observation, as reported by the correction step.
///
/// Records are created once and accumulated across rolling iterations;
/// they are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Counter column the observation belongs to (e.g. `count_8`).
    pub counter: String,
    /// Date of the observation.
    pub date: NaiveDate,
    /// Observed value.
    pub observed: f64,
    /// In-sample fitted value for that date.
    pub fitted: f64,
    /// Lower prediction-interval bound.
    pub lower: f64,
    /// Upper prediction-interval bound.
    pub upper: f64,
}

impl AnomalyRecord {
    /// Whether the observation lies above the upper bound.
    pub fn is_above(&self) -> bool {
        self.observed > self.upper
    }

    /// Whether the observation lies below the lower bound.
    pub fn is_below(&self) -> bool {
        self.observed < self.lower
    }
}

//! Anomaly detection and correction: the single-window step and the
//! rolling driver that advances it week by week.

mod rolling;
mod window;

pub use rolling::{DriverPhase, RollingDriver, RollingOptions, RollingOutcome, RollingState};
pub use window::{correct_window, NextDayForecast, WindowCorrection, WindowOptions};

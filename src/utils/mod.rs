//! Shared statistical helpers.

pub mod stats;

pub use stats::{linear_fit, mean, median, quantile, quantile_normal, std_dev, variance};

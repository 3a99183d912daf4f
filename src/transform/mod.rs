//! Series transformations applied before model fitting.

mod zero_fill;

pub use zero_fill::{fill_zero_gaps, DEFAULT_MAX_WEEKS_BACK};

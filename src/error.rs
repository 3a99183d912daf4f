//! Error types for the velostat pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, VeloError>;

/// Errors that can occur while loading, transforming, or correcting
/// counter data.
#[derive(Error, Debug)]
pub enum VeloError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient observations for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A requested column does not exist in the frame. Raised before any
    /// model fitting.
    #[error("column '{0}' not found in frame")]
    MissingColumn(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date index violates ordering constraints.
    #[error("date index error: {0}")]
    DateIndex(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Numerical failure inside a model or decomposition.
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A result directory or snapshot file is absent.
    #[error("missing resource: {0}")]
    MissingResource(String),

    /// CSV input could not be read or parsed.
    #[error("csv error: {0}")]
    Csv(String),

    /// Snapshot encoding/decoding failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for VeloError {
    fn from(err: csv::Error) -> Self {
        VeloError::Csv(err.to_string())
    }
}

impl From<bincode::Error> for VeloError {
    fn from(err: bincode::Error) -> Self {
        VeloError::Snapshot(err.to_string())
    }
}

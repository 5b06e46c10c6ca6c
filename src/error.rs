//! Error types for trueno-gapbench
//!
//! Only configuration and I/O problems are raised as `Err`. Per-cell
//! algorithm failures and undefined metrics are data, recorded inline in the
//! result tables (see [`crate::algorithm::AlgorithmFailure`] and
//! [`crate::metrics::MetricValue`]).

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-gapbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid experiment parameters, detected before any simulation runs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input handed to a library function (e.g. length mismatch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error (Parquet/Arrow file handling)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] with a formatted message.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

//! Error types of the SOM engine and its collaborators.

use thiserror::Error;

/// The main error type. All variants are raised at the point of violation and never retried.
#[derive(Error, Debug)]
pub enum SomError {
    /// Invalid construction parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A vector or matrix does not have the expected number of inputs.
    #[error("Dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch {
        /// The number of inputs of the network.
        expected: usize,
        /// The offending length.
        found: usize,
    },

    /// Training was requested on a dataset without samples.
    #[error("Empty dataset: no samples to train on")]
    EmptyDataset,

    /// Saving or loading a network failed, or the stored files are inconsistent.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Input table contains values that are not usable as features.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for SOM operations.
pub type Result<T> = std::result::Result<T, SomError>;

impl From<bincode::Error> for SomError {
    fn from(err: bincode::Error) -> Self {
        SomError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SomError {
    fn from(err: serde_json::Error) -> Self {
        SomError::Persistence(err.to_string())
    }
}

//! Error types for binning.

use thiserror::Error;

/// Errors that can occur while building a grid, extracting observations or
/// running a binning reduction.
#[derive(Error, Debug)]
pub enum BinningError {
    /// Invalid configuration, row count, or grid table.
    #[error("configuration error: {0}")]
    Config(String),

    /// The observation sequence was advanced past its end.
    #[error("observation sequence is exhausted")]
    Exhausted,

    /// A pass without time information was submitted to a time-filtered run.
    #[error("pass '{pass}' has no scan-line time information")]
    MissingTime { pass: String },

    /// Raster planes or slice rectangles that do not fit together.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The run was cancelled between two passes.
    #[error("binning run cancelled")]
    Cancelled,

    /// Filesystem error while reading a grid table or configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BinningError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a MissingTime error for the named pass.
    pub fn missing_time(pass: impl Into<String>) -> Self {
        Self::MissingTime { pass: pass.into() }
    }
}

impl From<serde_yaml::Error> for BinningError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for binning operations.
pub type Result<T> = std::result::Result<T, BinningError>;

//! Sweep error types.

use thiserror::Error;

use bb84_core::Bb84Error;

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;

/// Errors that can occur while configuring, running or exporting a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A grid point failed in the core simulator.
    #[error("Simulation error: {0}")]
    Core(#[from] Bb84Error),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("Export error: {0}")]
    Export(String),

    /// Malformed CSV input.
    #[error("CSV parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
}

impl From<serde_json::Error> for SweepError {
    fn from(e: serde_json::Error) -> Self {
        SweepError::Export(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for SweepError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        SweepError::Config(e.to_string())
    }
}

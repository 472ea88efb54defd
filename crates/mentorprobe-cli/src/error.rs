//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("{failed} of {total} scenario(s) failed")]
    ScenariosFailed {
        /// Failed scenarios
        failed: usize,
        /// Scenarios run
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Library error
    #[error(transparent)]
    Probe(#[from] mentorprobe::ProbeError),

    /// Browser could not be started
    #[error("Browser error: {0}")]
    Driver(#[from] mentorprobe::DriverError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

//! CLI error types.

use calcli_core::TimeParseError;
use calcli_store::StoreError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error (reading or writing calendar files).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A date, time or duration argument could not be parsed.
    #[error(transparent)]
    Time(#[from] TimeParseError),

    /// Invalid argument combination or value.
    #[error("{0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization failed.
    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

impl CliError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

//! Store error types.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing calendars.
///
/// Cloneable so a single failed load can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filesystem error while accessing `path`.
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    /// The file at `path` is not valid iCalendar data.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// No event with this uid exists.
    #[error("Event not found: {uid}")]
    NotFound { uid: String },

    /// Write attempted on a read-only calendar.
    #[error("Calendar is read-only: {calendar}")]
    ReadOnly { calendar: String },

    /// The event could not be encoded.
    #[error("Failed to encode event: {message}")]
    Encode { message: String },
}

impl StoreError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl AsRef<Path>, err: &io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Creates a parse error for `path`.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(uid: impl Into<String>) -> Self {
        Self::NotFound { uid: uid.into() }
    }

    /// Creates a read-only error.
    pub fn read_only(calendar: impl Into<String>) -> Self {
        Self::ReadOnly {
            calendar: calendar.into(),
        }
    }

    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Returns true if the error means the event does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

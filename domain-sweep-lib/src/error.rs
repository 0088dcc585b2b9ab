//! Error handling for sweep operations.
//!
//! Per-lookup failures never show up here: workers classify and log them
//! locally. This type covers what can go wrong before or around a run, such
//! as a bad configuration, an unusable resume marker or an output file that
//! cannot be opened.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the sweep engine.
#[derive(Debug, Clone, Error)]
pub enum SweepError {
    /// Configuration value failed validation
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// Resume marker is not a member of the configured candidate space
    #[error("Invalid checkpoint '{value}': {reason}")]
    InvalidCheckpoint { value: String, reason: String },

    /// File I/O errors on output, checkpoint or config files
    #[error("File error at '{path}': {message}")]
    FileError { path: String, message: String },

    /// DNS lookup exceeded its hard deadline
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Generic internal errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SweepError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new checkpoint error.
    pub fn checkpoint<V: Into<String>, R: Into<String>>(value: V, reason: R) -> Self {
        Self::InvalidCheckpoint {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for SweepError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

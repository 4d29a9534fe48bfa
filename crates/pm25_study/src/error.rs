//! # Study Error Types
//!
//! Only configuration loading and event-log construction can fail. Everything
//! that happens inside a tick is clamped, logged or ignored.

use thiserror::Error;

/// Errors that can occur in the study session.
#[derive(Error, Debug)]
pub enum StudyError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Event log file could not be created or written.
    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event log row could not be encoded.
    #[error("event log encoding error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<toml::de::Error> for StudyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for study operations.
pub type StudyResult<T> = Result<T, StudyError>;

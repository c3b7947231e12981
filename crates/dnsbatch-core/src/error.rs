//! Error types for dnsbatch
//!
//! This module defines all error types used throughout the crate.
//!
//! Sync confirmation timing out has no variant here: it is a
//! [`SyncOutcome`](crate::engine::SyncOutcome), not a failure.

use thiserror::Error;

/// Result type alias for dnsbatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsbatch
#[derive(Error, Debug)]
pub enum Error {
    /// Input file is missing or unreadable
    #[error("Input error: {0}")]
    Input(String),

    /// Input file is readable but does not have the expected shape
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// No hosted zone matched the URL base
    #[error("No hosted zone found: {0}")]
    ZoneNotFound(String),

    /// The provider rejected the change batch
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Querying the status of a submitted change failed
    #[error("Change status query failed: {0}")]
    ChangeStatus(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Create a malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(msg: impl Into<String>) -> Self {
        Self::ZoneNotFound(msg.into())
    }

    /// Create a submission error, keeping the provider's message verbatim
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::SubmissionFailed(msg.into())
    }

    /// Create a change status error
    pub fn change_status(msg: impl Into<String>) -> Self {
        Self::ChangeStatus(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error stems from the operator's input or settings
    ///
    /// The binary uses this to pick its exit code.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::MalformedInput(_) | Self::Csv(_) | Self::Config(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_classified() {
        assert!(Error::input("missing.csv").is_input_error());
        assert!(Error::malformed("no url column").is_input_error());
        assert!(Error::config("interval must be > 0").is_input_error());

        assert!(!Error::zone_not_found("lan.").is_input_error());
        assert!(!Error::submission("InvalidChangeBatch").is_input_error());
        assert!(!Error::change_status("throttled").is_input_error());
    }

    #[test]
    fn test_submission_message_is_verbatim() {
        let err = Error::submission("InvalidChangeBatch: RRSet with DNS name dev1.lan. is not permitted");
        assert_eq!(
            err.to_string(),
            "Submission failed: InvalidChangeBatch: RRSet with DNS name dev1.lan. is not permitted"
        );
    }
}

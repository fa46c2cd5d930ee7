//! Error types for the repset_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for repset_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout payload rejected by the remote store (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote store could not be reached
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Remote store answered with an unexpected status
    #[error("Remote store error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// Local state persistence error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Other(format!("Invalid response body: {}", err))
        } else {
            Error::Connectivity(err.to_string())
        }
    }
}

impl Error {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connectivity(_) => true,
            Error::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_not_retryable() {
        assert!(!Error::Validation("startTime is required".into()).is_retryable());
        assert!(Error::Connectivity("refused".into()).is_retryable());
        assert!(Error::Remote {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!Error::Remote {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
    }
}

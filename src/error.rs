//! Error types for gh-fanout.

use std::fmt;
use thiserror::Error;

/// The main error type for fan-out operations.
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("GitHub API error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

impl FanoutError {
    /// Build a remote error from an HTTP status and the response body.
    pub fn remote(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status.as_u16()),
            message: message.into(),
            source: None,
        }
    }

    /// Classify this error for batch reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::Config(_) | Self::Glob(_) => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Remote { .. } | Self::Io(_) | Self::Yaml(_) => ErrorKind::Remote,
        }
    }

    /// HTTP status reported by GitHub, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            _ => None,
        }
    }
}

// Transport failures (connect, timeout, body decode) all surface as remote errors.
impl From<reqwest::Error> for FanoutError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Coarse error classification recorded in batch outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Remote,
    RollbackPartialFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid input",
            Self::NotFound => "not found",
            Self::Remote => "remote error",
            Self::RollbackPartialFailure => "rollback partially failed",
        };
        f.write_str(name)
    }
}

/// A specialized Result type for fan-out operations.
pub type Result<T> = std::result::Result<T, FanoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            FanoutError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            FanoutError::NotFound {
                message: "x".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        let remote = FanoutError::remote(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "bad");
        assert_eq!(remote.kind(), ErrorKind::Remote);
        assert_eq!(remote.status(), Some(422));
    }

    #[test]
    fn test_remote_display_carries_message() {
        let err = FanoutError::remote(reqwest::StatusCode::FORBIDDEN, "403 Forbidden: nope");
        assert_eq!(err.to_string(), "GitHub API error: 403 Forbidden: nope");
    }
}

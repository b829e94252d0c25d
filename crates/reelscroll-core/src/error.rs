//! Error types for reelscroll.

use thiserror::Error;

/// Result type alias using reelscroll's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for reelscroll operations.
///
/// Cancellation is deliberately absent: a cancelled call resolves to an
/// empty payload instead of an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// HTTP/network request failed (connection error, non-2xx status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The GraphQL endpoint reported field-level errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that came back from the remote endpoint
    /// (network, HTTP status or GraphQL errors).
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Schema(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_transport() {
        let err = Error::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_error_display_schema() {
        let err = Error::Schema("Cannot query field \"foo\"".to_string());
        assert_eq!(err.to_string(), "Schema error: Cannot query field \"foo\"");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("synthetic marker".to_string());
        assert_eq!(err.to_string(), "Invalid input: synthetic marker");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing endpoint".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
    }

    #[test]
    fn test_transport_failure_classification() {
        assert!(Error::Transport("x".into()).is_transport_failure());
        assert!(Error::Schema("x".into()).is_transport_failure());
        assert!(!Error::InvalidInput("x".into()).is_transport_failure());
        assert!(!Error::Serialization("x".into()).is_transport_failure());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_clone_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        fn assert_clone<T: Clone>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
        assert_clone::<Error>();
    }
}

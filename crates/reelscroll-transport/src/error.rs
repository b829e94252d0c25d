//! Classification of catalog-server failures.

use reelscroll_core::Error;

/// Failure classes reported by the GraphQL endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphQLErrorCode {
    /// Missing or invalid API key.
    Unauthorized,
    /// Endpoint not found (wrong base URL).
    NotFound,
    /// Server overloaded.
    RateLimited,
    /// Server-side failure.
    ServerError,
    /// Request rejected as malformed.
    BadRequest,
    /// Anything else.
    Unknown,
}

impl GraphQLErrorCode {
    /// Determine error code from HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400 | 422 => Self::BadRequest,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError)
    }
}

/// Convert an HTTP failure to a reelscroll Error.
pub fn http_error(status: u16, body: &str) -> Error {
    let detail = body.trim();
    let detail = if detail.is_empty() { "no body" } else { detail };
    match GraphQLErrorCode::from_status(status) {
        GraphQLErrorCode::Unauthorized => {
            Error::Transport(format!("Authentication failed ({}): {}", status, detail))
        }
        GraphQLErrorCode::NotFound => {
            Error::Transport(format!("GraphQL endpoint not found ({})", status))
        }
        GraphQLErrorCode::RateLimited => {
            Error::Transport(format!("Rate limited ({}): {}", status, detail))
        }
        GraphQLErrorCode::ServerError => {
            Error::Transport(format!("Server error ({}): {}", status, detail))
        }
        GraphQLErrorCode::BadRequest | GraphQLErrorCode::Unknown => {
            Error::Transport(format!("HTTP {}: {}", status, detail))
        }
    }
}

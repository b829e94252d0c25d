//! Transport configuration.
//!
//! Configuration is read from environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STASH_URL` | `http://localhost:9999` | Catalog server base URL |
//! | `STASH_API_KEY` | (none) | API key sent as the `ApiKey` header |
//! | `STASH_TIMEOUT_SECS` | `30` | Per-request timeout |
//! | `STASH_SKIP_TLS_VERIFY` | `false` | Accept self-signed certificates |

use std::env;
use thiserror::Error;
use tracing::debug;

use reelscroll_core::defaults;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for reelscroll_core::Error {
    fn from(e: ConfigError) -> Self {
        reelscroll_core::Error::Config(e.to_string())
    }
}

/// Raw HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Server base URL (the GraphQL path is appended).
    pub base_url: String,
    /// API key, attached to every raw HTTP call when set.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (for self-signed certs on home servers).
    pub skip_tls_verify: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SERVER_URL.to_string(),
            api_key: None,
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

impl TransportConfig {
    /// Create from environment variables (with defaults).
    pub fn from_env() -> Self {
        let base_url = env::var("STASH_URL").unwrap_or_else(|_| defaults::SERVER_URL.to_string());
        let api_key = env::var("STASH_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let timeout_seconds = env::var("STASH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::HTTP_TIMEOUT_SECS);
        let skip_tls_verify = env::var("STASH_SKIP_TLS_VERIFY")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        debug!(
            subsystem = "transport",
            component = "config",
            base_url = %base_url,
            api_key_set = api_key.is_some(),
            timeout_seconds,
            "Loaded transport configuration from environment"
        );

        Self {
            base_url,
            api_key,
            timeout_seconds,
            skip_tls_verify,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Full GraphQL endpoint URL.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with(defaults::GRAPHQL_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, defaults::GRAPHQL_PATH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TransportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "http://localhost:9999/graphql");
    }

    #[test]
    fn test_endpoint_does_not_double_graphql_path() {
        let config = TransportConfig::default().with_base_url("https://media.lan/graphql/");
        assert_eq!(config.endpoint(), "https://media.lan/graphql");
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = TransportConfig::default().with_base_url("");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = TransportConfig::default().with_base_url("ftp://media.lan");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = TransportConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_converts_to_core_error() {
        let err: reelscroll_core::Error = ConfigError::Validation("bad".into()).into();
        assert!(matches!(err, reelscroll_core::Error::Config(_)));
    }
}

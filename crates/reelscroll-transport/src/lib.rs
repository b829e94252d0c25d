//! # reelscroll-transport
//!
//! GraphQL transport backends for reelscroll.
//!
//! This crate provides:
//! - [`HttpTransport`]: raw HTTP POST to the catalog's GraphQL endpoint,
//!   with the API key attached as a header
//! - [`InjectedTransport`]: adapter over a host-provided in-process client
//! - [`select_transport`]: picks one backend once, at construction
//! - `mock` (feature `mock`): recording mock for tests
//!
//! Every backend honours the same contract: a cancelled call resolves to an
//! empty payload, never to an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use reelscroll_transport::{select_transport, TransportConfig};
//!
//! let transport = select_transport(None, TransportConfig::from_env()).unwrap();
//! assert_eq!(transport.name(), "http");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod injected;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::sync::Arc;
use tracing::info;

use reelscroll_core::{HostClient, Result, Transport};

pub use config::{ConfigError, TransportConfig};
pub use error::{http_error, GraphQLErrorCode};
pub use http::HttpTransport;
pub use injected::InjectedTransport;
pub use types::{GraphQLError, GraphQLResponse};

/// Choose the transport backend.
///
/// An injected host client wins when present; otherwise raw HTTP is built
/// from `config`. The choice is made once and is invisible to callers.
pub fn select_transport(
    host: Option<Arc<dyn HostClient>>,
    config: TransportConfig,
) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match host {
        Some(client) => Arc::new(InjectedTransport::new(client)),
        None => Arc::new(HttpTransport::new(config)?),
    };
    info!(
        subsystem = "transport",
        backend = transport.name(),
        "Selected transport backend"
    );
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelscroll_core::GraphQLRequest;
    use serde_json::Value;

    struct NullClient;

    #[async_trait]
    impl HostClient for NullClient {
        async fn query(&self, _request: &GraphQLRequest) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_select_prefers_injected_client() {
        let transport =
            select_transport(Some(Arc::new(NullClient)), TransportConfig::default()).unwrap();
        assert_eq!(transport.name(), "injected");
    }

    #[test]
    fn test_select_falls_back_to_http() {
        let transport = select_transport(None, TransportConfig::default()).unwrap();
        assert_eq!(transport.name(), "http");
    }

    #[test]
    fn test_select_surfaces_config_errors() {
        let config = TransportConfig::default().with_base_url("");
        assert!(select_transport(None, config).is_err());
    }
}

//! Raw HTTP GraphQL backend.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use reelscroll_core::{defaults, empty_payload, Error, GraphQLRequest, Result, Transport};

use crate::config::TransportConfig;
use crate::error::http_error;
use crate::types::GraphQLResponse;

/// GraphQL over HTTP POST.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    endpoint: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config.endpoint();
        info!(
            subsystem = "transport",
            component = "http",
            endpoint = %endpoint,
            api_key_set = config.api_key.is_some(),
            "Initializing HTTP GraphQL transport"
        );

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(TransportConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build a POST with authentication if configured.
    fn build_request(&self, request: &GraphQLRequest) -> reqwest::RequestBuilder {
        let mut req = self.client.post(&self.endpoint);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header(defaults::API_KEY_HEADER, api_key);
        }

        req.header("Content-Type", "application/json").json(request)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request, cancel), fields(
        subsystem = "transport",
        component = "http",
        op = %request.operation_name,
    ))]
    async fn execute(
        &self,
        request: &GraphQLRequest,
        cancel: &CancellationToken,
    ) -> Result<JsonValue> {
        if cancel.is_cancelled() {
            debug!("Cancelled before send");
            return Ok(empty_payload());
        }

        let start = Instant::now();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled while awaiting response");
                return Ok(empty_payload());
            }
            result = self.build_request(request).send() => {
                result.map_err(|e| {
                    warn!(error = %e, "GraphQL request failed");
                    Error::Transport(format!("Request failed: {}", e))
                })?
            }
        };

        if cancel.is_cancelled() {
            debug!("Cancelled after response");
            return Ok(empty_payload());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "GraphQL endpoint returned error status");
            return Err(http_error(status.as_u16(), &body));
        }

        let body: GraphQLResponse = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled while reading body");
                return Ok(empty_payload());
            }
            parsed = response.json::<GraphQLResponse>() => {
                parsed.map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?
            }
        };

        if cancel.is_cancelled() {
            debug!("Cancelled before interpreting data");
            return Ok(empty_payload());
        }

        if let Some(message) = body.error_message() {
            warn!(error = %message, "GraphQL response carried errors");
            return Err(Error::Schema(message));
        }

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "GraphQL call complete"
        );
        Ok(body.data.unwrap_or_else(empty_payload))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

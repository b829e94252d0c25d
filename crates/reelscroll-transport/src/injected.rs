//! Adapter around the host application's injected query client.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use reelscroll_core::{empty_payload, GraphQLRequest, HostClient, Result, Transport};

/// Transport that delegates to an in-process [`HostClient`].
///
/// The host client brings its own credentials; this adapter only adds the
/// cancellation contract.
pub struct InjectedTransport {
    client: Arc<dyn HostClient>,
}

impl InjectedTransport {
    pub fn new(client: Arc<dyn HostClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for InjectedTransport {
    #[instrument(skip(self, request, cancel), fields(
        subsystem = "transport",
        component = "injected",
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

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled while awaiting host client");
                return Ok(empty_payload());
            }
            result = self.client.query(request) => result,
        };

        if cancel.is_cancelled() {
            debug!("Cancelled after host client response");
            return Ok(empty_payload());
        }

        match data {
            Ok(JsonValue::Null) => Ok(empty_payload()),
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, "Host client query failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "injected"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscroll_core::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedClient {
        calls: AtomicUsize,
        response: Result<JsonValue>,
        delay: Duration,
    }

    #[async_trait]
    impl HostClient for FixedClient {
        async fn query(&self, _request: &GraphQLRequest) -> Result<JsonValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    fn client(response: Result<JsonValue>, delay: Duration) -> Arc<FixedClient> {
        Arc::new(FixedClient {
            calls: AtomicUsize::new(0),
            response,
            delay,
        })
    }

    fn request() -> GraphQLRequest {
        GraphQLRequest::new("FindTags", "query FindTags { findTags { count } }")
    }

    #[tokio::test]
    async fn test_passes_data_through() {
        let host = client(Ok(json!({"findTags": {"count": 3}})), Duration::ZERO);
        let transport = InjectedTransport::new(host.clone());
        let data = transport
            .execute(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(data["findTags"]["count"], 3);
        assert_eq!(host.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_never_calls_host() {
        let host = client(Ok(json!({"x": 1})), Duration::ZERO);
        let transport = InjectedTransport::new(host.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let data = transport.execute(&request(), &cancel).await.unwrap();
        assert_eq!(data, empty_payload());
        assert_eq!(host.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_flight_returns_empty() {
        let host = client(Ok(json!({"x": 1})), Duration::from_secs(10));
        let transport = InjectedTransport::new(host);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let data = transport.execute(&request(), &cancel).await.unwrap();
        assert_eq!(data, empty_payload());
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let host = client(Err(Error::Schema("bad field".into())), Duration::ZERO);
        let transport = InjectedTransport::new(host);
        let err = transport
            .execute(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, Error::Schema("bad field".into()));
    }

    #[tokio::test]
    async fn test_null_data_becomes_empty_payload() {
        let host = client(Ok(JsonValue::Null), Duration::ZERO);
        let transport = InjectedTransport::new(host);
        let data = transport
            .execute(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(data, empty_payload());
    }
}

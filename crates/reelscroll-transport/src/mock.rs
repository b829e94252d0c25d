//! Mock transport for deterministic testing.
//!
//! Answers per operation name and records every call, so tests can assert
//! on how many network round-trips an operation caused.
//!
//! ## Usage
//!
//! ```rust
//! use reelscroll_transport::mock::MockTransport;
//! use serde_json::json;
//!
//! let transport = MockTransport::new()
//!     .with_response("FindTags", json!({"findTags": {"count": 0, "tags": []}}))
//!     .with_latency_ms(5);
//! assert_eq!(transport.call_count("FindTags"), 0);
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use reelscroll_core::{empty_payload, Error, GraphQLRequest, Result, Transport};

type Responder = dyn Fn(&GraphQLRequest) -> Result<JsonValue> + Send + Sync;

/// Mock transport for testing.
#[derive(Clone)]
pub struct MockTransport {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Clone, Default)]
struct MockConfig {
    responders: HashMap<String, Arc<Responder>>,
    latency_ms: u64,
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub variables: JsonValue,
    pub timestamp: std::time::Instant,
}

impl MockTransport {
    /// Create a mock that answers every operation with an empty payload.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `operation` with a fixed `data` payload.
    pub fn with_response(self, operation: impl Into<String>, data: JsonValue) -> Self {
        self.with_responder(operation, move |_| Ok(data.clone()))
    }

    /// Answer `operation` with a fixed error.
    pub fn with_failure(self, operation: impl Into<String>, error: Error) -> Self {
        self.with_responder(operation, move |_| Err(error.clone()))
    }

    /// Answer `operation` by calling `responder` with the request.
    pub fn with_responder<F>(mut self, operation: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&GraphQLRequest) -> Result<JsonValue> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.config)
            .responders
            .insert(operation.into(), Arc::new(responder));
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Calls issued for `operation`.
    pub fn calls_for(&self, operation: &str) -> Vec<MockCall> {
        self.log()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of calls issued for `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.log()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Number of calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.log().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.log().clear()
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: &GraphQLRequest,
        cancel: &CancellationToken,
    ) -> Result<JsonValue> {
        if cancel.is_cancelled() {
            return Ok(empty_payload());
        }

        self.log().push(MockCall {
            operation: request.operation_name.clone(),
            variables: request.variables.clone(),
            timestamp: std::time::Instant::now(),
        });

        if self.config.latency_ms > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(empty_payload()),
                _ = tokio::time::sleep(Duration::from_millis(self.config.latency_ms)) => {}
            }
        }

        if cancel.is_cancelled() {
            return Ok(empty_payload());
        }

        match self.config.responders.get(&request.operation_name) {
            Some(responder) => responder(request),
            None => Ok(empty_payload()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(op: &str) -> GraphQLRequest {
        GraphQLRequest::new(op, format!("query {} {{ x }}", op))
    }

    #[tokio::test]
    async fn test_fixed_response_and_call_log() {
        let mock = MockTransport::new().with_response("FindTags", json!({"findTags": {"count": 2}}));
        let data = mock
            .execute(&request("FindTags"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(data["findTags"]["count"], 2);
        assert_eq!(mock.call_count("FindTags"), 1);
        assert_eq!(mock.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_operation_returns_empty() {
        let mock = MockTransport::new();
        let data = mock
            .execute(&request("Other"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(data, empty_payload());
    }

    #[tokio::test]
    async fn test_failure_response() {
        let mock = MockTransport::new().with_failure("SceneAddO", Error::Transport("503".into()));
        let err = mock
            .execute(&request("SceneAddO"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_transport_failure());
    }

    #[tokio::test]
    async fn test_cancelled_calls_are_not_logged() {
        let mock = MockTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        mock.execute(&request("FindTags"), &cancel).await.unwrap();
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_call_log() {
        let mock = MockTransport::new();
        let clone = mock.clone();
        clone
            .execute(&request("FindTags"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(mock.call_count("FindTags"), 1);
        mock.clear_calls();
        assert_eq!(clone.total_calls(), 0);
    }
}

//! Core traits for reelscroll abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

// =============================================================================
// GRAPHQL REQUESTS
// =============================================================================

/// A GraphQL operation ready to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// Operation name (also used for logging and mock routing).
    #[serde(rename = "operationName")]
    pub operation_name: String,
    /// Query or mutation document.
    pub query: String,
    /// Variables object.
    #[serde(default)]
    pub variables: JsonValue,
}

impl GraphQLRequest {
    pub fn new(operation_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            query: query.into(),
            variables: JsonValue::Object(Map::new()),
        }
    }

    /// Attach variables.
    pub fn with_variables(mut self, variables: JsonValue) -> Self {
        self.variables = variables;
        self
    }

    /// True if the document is a mutation.
    pub fn is_mutation(&self) -> bool {
        self.query.trim_start().starts_with("mutation")
    }
}

/// Payload returned when a call is cancelled: an empty `data` object, which
/// decodes into default (empty) responses.
pub fn empty_payload() -> JsonValue {
    JsonValue::Object(Map::new())
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Executes GraphQL operations against the catalog.
///
/// Implementations return the `data` member of the response. A call whose
/// `cancel` token is (or becomes) cancelled resolves to [`empty_payload`]
/// instead of an error, so callers cannot tell it apart from "found
/// nothing".
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one operation.
    async fn execute(
        &self,
        request: &GraphQLRequest,
        cancel: &CancellationToken,
    ) -> Result<JsonValue>;

    /// Short backend name for logs ("http", "injected", ...).
    fn name(&self) -> &'static str;
}

/// In-process query client injected by the host application.
///
/// The host client carries its own credentials and resolves to the `data`
/// member of the response. It knows nothing about cancellation; the
/// adapter wrapping it applies the cancellation contract.
#[async_trait]
pub trait HostClient: Send + Sync {
    async fn query(&self, request: &GraphQLRequest) -> Result<JsonValue>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_operation_name() {
        let req = GraphQLRequest::new("FindTags", "query FindTags { findTags { count } }")
            .with_variables(json!({"filter": {"q": "x"}}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["operationName"], "FindTags");
        assert_eq!(value["variables"]["filter"]["q"], "x");
    }

    #[test]
    fn test_default_variables_are_empty_object() {
        let req = GraphQLRequest::new("Op", "query Op { x }");
        assert_eq!(req.variables, json!({}));
    }

    #[test]
    fn test_is_mutation() {
        assert!(GraphQLRequest::new("SceneAddO", "  mutation SceneAddO { x }").is_mutation());
        assert!(!GraphQLRequest::new("FindTags", "query FindTags { x }").is_mutation());
    }

    #[test]
    fn test_empty_payload_decodes_to_defaults() {
        #[derive(Deserialize, Default)]
        struct Resp {
            #[serde(default)]
            count: u64,
        }
        let resp: Resp = serde_json::from_value(empty_payload()).unwrap();
        assert_eq!(resp.count, 0);
    }
}

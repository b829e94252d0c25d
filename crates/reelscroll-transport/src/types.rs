//! GraphQL wire envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope: `{data, errors}`.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

/// A single field-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

impl GraphQLResponse {
    /// Joined error messages, if the response carried any.
    pub fn error_message(&self) -> Option<String> {
        let errors = self.errors.as_ref().filter(|e| !e.is_empty())?;
        Some(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_joins_errors() {
        let resp: GraphQLResponse = serde_json::from_value(json!({
            "errors": [{"message": "first"}, {"message": "second", "path": ["findTags"]}]
        }))
        .unwrap();
        assert_eq!(resp.error_message().as_deref(), Some("first; second"));
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_no_errors() {
        let resp: GraphQLResponse =
            serde_json::from_value(json!({"data": {"x": 1}, "errors": []})).unwrap();
        assert!(resp.error_message().is_none());
    }
}

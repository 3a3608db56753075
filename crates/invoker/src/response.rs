//! Decoded API responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded response body.
///
/// An empty raw body decodes to the empty-string sentinel rather than being
/// handed to a parser; see [`ApiResponse::empty`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse(Value);

impl ApiResponse {
    /// Wraps an already decoded value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The sentinel returned for an empty response body.
    pub fn empty() -> Self {
        Self(Value::String(String::new()))
    }

    /// Returns `true` if this is the empty-body sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(&self.0, Value::String(s) if s.is_empty())
    }

    /// Returns the top-level `result` field, if the body is an object with one.
    pub fn result(&self) -> Option<&Value> {
        self.0.get("result")
    }

    /// Borrows the decoded value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the decoded value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ApiResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_sentinel_is_an_empty_string() {
        let empty = ApiResponse::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.as_value(), &json!(""));
        assert!(empty.result().is_none());
    }

    #[test]
    fn result_reads_top_level_field() {
        let response = ApiResponse::new(json!({"result": {"ok": true}}));
        assert!(!response.is_empty());
        assert_eq!(response.result(), Some(&json!({"ok": true})));
    }
}

//! Response body parsers, selected by the configured response format.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{ApiResponse, InvokeError};

/// Translates a raw response body into a structured value.
pub trait BodyParser: Send + Sync {
    /// The response format this parser handles (e.g. `"json"`).
    fn format(&self) -> &str;

    /// Decodes a non-empty raw body.
    ///
    /// # Errors
    ///
    /// [`InvokeError::Decode`] carrying `raw` when the body is malformed.
    fn parse_body(&self, raw: &str) -> Result<ApiResponse, InvokeError>;

    /// Decodes `raw`, mapping an empty body to [`ApiResponse::empty`].
    fn parse(&self, raw: &str) -> Result<ApiResponse, InvokeError> {
        if raw.is_empty() {
            return Ok(ApiResponse::empty());
        }
        self.parse_body(raw)
    }
}

/// The default `json` parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl BodyParser for JsonParser {
    fn format(&self) -> &str {
        "json"
    }

    fn parse_body(&self, raw: &str) -> Result<ApiResponse, InvokeError> {
        serde_json::from_str(raw)
            .map(ApiResponse::new)
            .map_err(|e| InvokeError::Decode {
                format: self.format().to_owned(),
                raw_body: raw.to_owned(),
                message: e.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------

/// Parsers keyed by format name.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn BodyParser>>,
}

impl ParserRegistry {
    /// Creates a registry holding only the `json` parser.
    pub fn with_defaults() -> Self {
        Self::default().register(JsonParser)
    }

    /// Registers `parser` under its own format name, replacing any previous one.
    #[must_use]
    pub fn register(mut self, parser: impl BodyParser + 'static) -> Self {
        self.parsers
            .insert(parser.format().to_owned(), Arc::new(parser));
        self
    }

    /// Resolves the parser for `format`.
    ///
    /// # Errors
    ///
    /// [`InvokeError::UnsupportedFormat`] when nothing is registered for it.
    pub fn resolve(&self, format: &str) -> Result<Arc<dyn BodyParser>, InvokeError> {
        self.parsers
            .get(format)
            .cloned()
            .ok_or_else(|| InvokeError::UnsupportedFormat {
                format: format.to_owned(),
            })
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.parsers.keys().collect();
        formats.sort();
        f.debug_struct("ParserRegistry")
            .field("formats", &formats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_body_is_not_decoded() {
        let response = JsonParser.parse("").unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn json_body_is_decoded() {
        let response = JsonParser.parse(r#"{"result":"tok123"}"#).unwrap();
        assert_eq!(response.as_value(), &json!({"result": "tok123"}));
    }

    #[test]
    fn malformed_body_keeps_raw_text() {
        let err = JsonParser.parse("<html>oops</html>").unwrap_err();
        match err {
            InvokeError::Decode {
                format, raw_body, ..
            } => {
                assert_eq!(format, "json");
                assert_eq!(raw_body, "<html>oops</html>");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_format_is_reported() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.resolve("json").is_ok());
        assert!(matches!(
            registry.resolve("xml"),
            Err(InvokeError::UnsupportedFormat { ref format }) if format == "xml"
        ));
    }

    #[test]
    fn custom_parsers_can_be_registered() {
        struct Plain;
        impl BodyParser for Plain {
            fn format(&self) -> &str {
                "txt"
            }
            fn parse_body(&self, raw: &str) -> Result<ApiResponse, InvokeError> {
                Ok(ApiResponse::new(json!(raw)))
            }
        }

        let registry = ParserRegistry::with_defaults().register(Plain);
        let parser = registry.resolve("txt").unwrap();
        assert_eq!(parser.parse("hello").unwrap().as_value(), &json!("hello"));
    }
}

//! Request dispatch: descriptor to URL, transport exchange, body decoding.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{ApiResponse, InvokeError, ParserRegistry, RequestDescriptor, Transport};

/// Sends requests through a [`Transport`] and decodes the responses.
///
/// The parser is resolved from the descriptor's format on every call, so a
/// reconfigured response format takes effect on the next request.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    parsers: ParserRegistry,
}

impl RequestDispatcher {
    /// Creates a dispatcher.
    pub fn new(transport: Arc<dyn Transport>, parsers: ParserRegistry) -> Self {
        Self { transport, parsers }
    }

    /// Sends `descriptor` and decodes the body with the matching parser.
    ///
    /// The HTTP status does not affect decoding; API-level failures are
    /// reported inside the body.
    ///
    /// # Errors
    ///
    /// - [`InvokeError::UnsupportedFormat`] before sending when no parser
    ///   matches the descriptor's format.
    /// - [`InvokeError::Configuration`] when no valid URL can be built.
    /// - [`InvokeError::Transport`] when the exchange fails. Not retried.
    /// - Parser errors, as returned by the parser.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, InvokeError> {
        let parser = self.parsers.resolve(&descriptor.format)?;
        let authenticated = descriptor.auth.is_some();
        // The query may carry login secrets; only the host and path are logged.
        let host = descriptor.host.clone();
        let path = descriptor.path();
        let request = descriptor.into_outbound()?;

        debug!(%host, %path, authenticated, "dispatching request");
        let response = self.transport.send(&request).await.inspect_err(|e| {
            warn!(%host, %path, error = %e, "transport failed");
        })?;

        debug!(
            status = response.status,
            bytes = response.body.len(),
            "response received"
        );
        parser.parse(&response.body)
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("parsers", &self.parsers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::{
        BasicAuth, ClientConfig, MethodResolver, OutboundRequest, RawResponse, TransportError,
    };

    struct Canned {
        reply: Result<RawResponse, String>,
        sent: Mutex<Vec<OutboundRequest>>,
    }

    impl Canned {
        fn body(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(RawResponse {
                    status,
                    body: body.to_owned(),
                }),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_owned()),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
            self.sent.lock().push(request.clone());
            self.reply.clone().map_err(TransportError::new)
        }
    }

    fn descriptor(config: &ClientConfig) -> RequestDescriptor {
        let method = MethodResolver::default()
            .resolve("Enduser/export/v3")
            .unwrap();
        RequestDescriptor::new(config, method, None)
    }

    fn dispatcher(transport: Arc<Canned>) -> RequestDispatcher {
        RequestDispatcher::new(transport, ParserRegistry::with_defaults())
    }

    #[tokio::test]
    async fn decodes_json_body() {
        let transport = Arc::new(Canned::body(200, r#"{"result":{"ok":true}}"#));
        let response = dispatcher(transport.clone())
            .send(descriptor(&ClientConfig::default()))
            .await
            .unwrap();

        assert_eq!(response.as_value(), &json!({"result": {"ok": true}}));
        assert_eq!(
            transport.sent.lock()[0].url,
            "https://rest-api.pay.nl/v3/Enduser/export/json"
        );
    }

    #[tokio::test]
    async fn passes_auth_to_transport() {
        let transport = Arc::new(Canned::body(200, "{}"));
        let d = descriptor(&ClientConfig::default()).with_auth(BasicAuth {
            user: "handshake".into(),
            password: "tok".into(),
        });
        dispatcher(transport.clone()).send(d).await.unwrap();

        let sent = transport.sent.lock();
        assert_eq!(sent[0].auth.as_ref().map(BasicAuth::to_pair).as_deref(), Some("handshake:tok"));
    }

    #[tokio::test]
    async fn empty_body_yields_sentinel() {
        let transport = Arc::new(Canned::body(204, ""));
        let response = dispatcher(transport)
            .send(descriptor(&ClientConfig::default()))
            .await
            .unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_still_decoded() {
        let transport = Arc::new(Canned::body(
            401,
            r#"{"request":{"result":"0","errorMessage":"unauthorized"}}"#,
        ));
        let response = dispatcher(transport)
            .send(descriptor(&ClientConfig::default()))
            .await
            .unwrap();
        assert_eq!(response.as_value()["request"]["errorMessage"], json!("unauthorized"));
    }

    #[tokio::test]
    async fn transport_failure_is_wrapped() {
        let transport = Arc::new(Canned::failing("connection reset"));
        let err = dispatcher(transport)
            .send(descriptor(&ClientConfig::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Transport(ref t) if t.message() == "connection reset"));
    }

    #[tokio::test]
    async fn unknown_format_fails_before_sending() {
        let transport = Arc::new(Canned::body(200, "{}"));
        let config = ClientConfig {
            response_format: "xml".into(),
            ..ClientConfig::default()
        };
        let err = dispatcher(transport.clone())
            .send(descriptor(&config))
            .await
            .unwrap_err();

        assert!(matches!(err, InvokeError::UnsupportedFormat { .. }));
        assert!(transport.sent.lock().is_empty());
    }
}

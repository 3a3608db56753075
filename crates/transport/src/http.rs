//! `reqwest`-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use invoker::{OutboundRequest, RawResponse, Transport, TransportError};
use tracing::debug;

/// Sends requests as HTTP `GET`s with optional basic authentication.
///
/// Never retries. Redirects are not followed, so basic credentials are only
/// ever sent to the configured host. Errors never carry the request URL,
/// whose query may hold login secrets.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with default settings (no request timeout).
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Starts building a transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut req = self
            .http
            .get(&request.url)
            .header(reqwest::header::ACCEPT, "*/*");
        if let Some(auth) = &request.auth {
            req = req.basic_auth(&auth.user, Some(&auth.password));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::with_source("send request", e.without_url()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::with_source("read response body", e.without_url()))?;

        debug!(status, bytes = body.len(), "http exchange complete");
        Ok(RawResponse { status, body })
    }
}

// ---------------------------------------------------------------------------

/// Configures an [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    /// Fails any request that takes longer than `timeout` end to end.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the transport.
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("paynl-rust/{}", env!("CARGO_PKG_VERSION")));
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::with_source("build http client", e))?;
        Ok(HttpTransport { http })
    }
}

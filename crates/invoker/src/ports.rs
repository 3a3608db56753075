//! Port traits implemented by infrastructure crates.
//!
//! The core never opens sockets. It builds an [`OutboundRequest`] and hands it
//! to a [`Transport`]; it asks a [`LocalAddress`] for the machine's address
//! when logging in.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::{InvokeError, TransportError};

/// Basic-auth credentials carried at the transport level, never in the URL.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name half (the configured handshake user).
    pub user: String,
    /// Password half (the handshake token).
    pub password: String,
}

impl BasicAuth {
    /// Returns the `"user:password"` form.
    pub fn to_pair(&self) -> String {
        format!("{}:{}", self.user, self.password)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A fully built request, ready for the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Canonical request URL, including the encoded query.
    pub url: String,
    /// Transport-level basic credentials, when the call is authenticated.
    pub auth: Option<BasicAuth>,
}

/// The raw outcome of a network exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// Performs the actual network exchange for a request.
///
/// Implementations must not retry; a failed exchange is reported once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    async fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Reports the machine's outbound IP address.
///
/// Called synchronously, only while logging in.
pub trait LocalAddress: Send + Sync {
    /// Returns the outbound IPv4 or IPv6 address.
    ///
    /// # Errors
    ///
    /// [`InvokeError::LocalAddress`] when no address can be determined.
    fn local_ip(&self) -> Result<IpAddr, InvokeError>;
}

/// A [`LocalAddress`] that always reports the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAddress(pub IpAddr);

impl LocalAddress for FixedAddress {
    fn local_ip(&self) -> Result<IpAddr, InvokeError> {
        Ok(self.0)
    }
}

//! Error taxonomy for the invocation pipeline.
//!
//! Every failure of [`crate::Client::invoke`] surfaces as exactly one
//! [`InvokeError`]. Nothing is retried or swallowed internally: the first
//! failure on any path (validation, handshake, transport, decode) is the
//! outcome of the call.
//!
//! [`TransportError`] is defined separately because it is the error type of the
//! [`crate::Transport`] port; infrastructure crates construct it without
//! needing to know about the rest of the taxonomy.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// A network-level failure reported by a [`crate::Transport`] implementation.
///
/// Carries a human-readable message and, when available, the underlying cause
/// so callers can walk the full `source()` chain.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// Creates a transport error without an underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping `source`.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the message describing this failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// Invocation errors
// ---------------------------------------------------------------------------

/// Errors produced by the invocation pipeline.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The method string is not in `namespace/action/version` form.
    ///
    /// Produced by: [`crate::MethodResolver::resolve`], before any I/O.
    #[error("expected namespace/action/version syntax, got '{method}'")]
    Validation {
        /// The method string as supplied by the caller.
        method: String,
    },

    /// No complete credential set is configured, so no handshake can be made.
    ///
    /// No network call is attempted when this is returned.
    #[error("cannot create handshake without credentials")]
    Credential,

    /// The transport failed to complete the exchange.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body did not parse as the configured response format.
    #[error("failed to decode {format} response: {message}")]
    Decode {
        /// The format the body was expected to be in (e.g. `"json"`).
        format: String,
        /// The body exactly as received, kept for diagnostics.
        raw_body: String,
        /// The parser's description of the failure.
        message: String,
    },

    /// The login call completed but returned no usable handshake.
    #[error("login returned no usable handshake")]
    Authentication {
        /// The decoded login response.
        response: serde_json::Value,
    },

    /// No body parser is registered for the configured response format.
    #[error("no body parser registered for response format '{format}'")]
    UnsupportedFormat {
        /// The configured response format name.
        format: String,
    },

    /// The local network address could not be determined while logging in.
    #[error("could not determine local IP address: {message}")]
    LocalAddress {
        /// Description of the lookup failure.
        message: String,
    },

    /// The configuration cannot produce a valid request.
    ///
    /// Produced when, for example, `apiHost` is not a valid host.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl InvokeError {
    /// Convenience constructor for [`InvokeError::Validation`].
    pub fn validation(method: impl Into<String>) -> Self {
        Self::Validation {
            method: method.into(),
        }
    }

    /// Returns the raw response body if this is a decode failure.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Self::Decode { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }
}

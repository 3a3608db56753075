//! Invocation core for the Pay.nl REST API.
//!
//! Remote operations are addressed as `namespace/action/version`. Most of them
//! require a handshake: a short-lived session token obtained by logging in and
//! sent as basic-auth credentials. This crate resolves method strings, decides
//! per method whether a handshake is needed, obtains and caches handshakes,
//! builds requests, and decodes responses.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate opens no sockets. The
//! network exchange and the local IP lookup are supplied through the
//! [`Transport`] and [`LocalAddress`] ports; the `transport` crate implements
//! them.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | [`Client`] orchestrator and its builder |
//! | [`resolver`] | Method string parsing ([`MethodResolver`]) |
//! | [`auth_table`] | Per-namespace auth-requirement tables |
//! | [`handshake`] | Handshake cache, token derivation, login |
//! | [`dispatcher`] | Request dispatch and decoding |
//! | [`request`] | Request descriptors and canonical URLs |
//! | [`parser`] | Body parsers keyed by response format |
//! | [`config`] | Client configuration and reconfiguration |
//! | [`ports`] | [`Transport`] and [`LocalAddress`] port traits |
//! | [`clock`] | Time source |
//! | [`identifiers`] | Newtype identifiers |
//! | [`errors`] | Error taxonomy |
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use invoker::{Client, ConfigPatch, Params, Transport, LocalAddress};
//! # async fn run(transport: Arc<dyn Transport>, address: Arc<dyn LocalAddress>) -> Result<(), invoker::InvokeError> {
//! let client = Client::builder(transport, address)
//!     .configure(ConfigPatch {
//!         account_id: Some("AT-0000-0000".into()),
//!         token: Some("api-token".into()),
//!         ..ConfigPatch::default()
//!     })
//!     .build();
//!
//! let mut params = Params::new();
//! params.insert("id".into(), 7.into());
//! let response = client.invoke("Enduser/export/v3", Some(params)).await?;
//! println!("{}", response.as_value());
//! # Ok(())
//! # }
//! ```

pub mod auth_table;
pub mod client;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod handshake;
pub mod identifiers;
pub mod parser;
pub mod ports;
pub mod request;
pub mod resolver;
pub mod response;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use auth_table::{AuthRegistry, AuthRequirementTable, AUTHENTICATION_NAMESPACE};
pub use client::{Client, ClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiProtocol, ClientConfig, ConfigPatch, Credentials};
pub use dispatcher::RequestDispatcher;
pub use errors::{InvokeError, TransportError};
pub use handshake::{
    derive_token, login_request, CredentialStore, HandshakeCredential, HandshakeManager,
    LoginInvoker, LOGIN_BY_TOKEN_METHOD, LOGIN_METHOD,
};
pub use identifiers::{Action, InvocationId, MethodIdentifier, Namespace, Version};
pub use parser::{BodyParser, JsonParser, ParserRegistry};
pub use ports::{BasicAuth, FixedAddress, LocalAddress, OutboundRequest, RawResponse, Transport};
pub use request::{Params, RequestDescriptor};
pub use resolver::MethodResolver;
pub use response::ApiResponse;

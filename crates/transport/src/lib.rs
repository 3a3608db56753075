//! Pay.nl transport adapters.
//!
//! Implements the [`invoker::Transport`] port over `reqwest` and the
//! [`invoker::LocalAddress`] port over the local network stack.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection handling, TLS, timeouts and socket-level
//! address discovery live here. The [`invoker`] crate sees only the port
//! traits.

mod address;
mod http;

pub use address::OutboundAddress;
pub use http::{HttpTransport, HttpTransportBuilder};

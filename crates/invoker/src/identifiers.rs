//! Newtype identifiers.
//!
//! The three parts of a remote operation address are distinct newtypes so a
//! [`Namespace`] can never be passed where a [`Version`] is expected, even
//! though all three are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Method path segments. A segment is never empty, so `new` rejects "" and the
// resolver can turn `None` straight into a validation error.
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wraps a method path segment; `None` for an empty segment.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let value = value.into();
                (!value.is_empty()).then_some(Self(value))
            }

            /// Returns the segment text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// The API namespace of a remote operation (e.g. `"Enduser"`).
    ///
    /// Also the key under which auth-requirement tables are registered.
    Namespace
}

string_id! {
    /// The action within a namespace (e.g. `"export"`).
    Action
}

string_id! {
    /// The API version of an action (e.g. `"v3"`).
    Version
}

// ---------------------------------------------------------------------------

/// The resolved `namespace/action/version` address of a remote operation.
///
/// Produced by [`crate::MethodResolver::resolve`]; segments are kept verbatim
/// (case is preserved).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodIdentifier {
    /// The API namespace.
    pub namespace: Namespace,
    /// The action within the namespace.
    pub action: Action,
    /// The action's version.
    pub version: Version,
}

impl std::fmt::Display for MethodIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.action, self.version)
    }
}

// ---------------------------------------------------------------------------

/// Identifies a single call to [`crate::Client::invoke`].
///
/// Generated fresh for every invocation and recorded on its tracing span so
/// the handshake and dispatch events of one call can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_segments_are_rejected() {
        assert!(Namespace::new("").is_none());
        assert_eq!(Action::new("export").map(|a| a.to_string()), Some("export".into()));
    }

    #[test]
    fn method_identifier_formats_as_path() {
        let id = MethodIdentifier {
            namespace: Namespace::new("Enduser").unwrap(),
            action: Action::new("export").unwrap(),
            version: Version::new("v3").unwrap(),
        };
        assert_eq!(id.to_string(), "Enduser/export/v3");
    }

    #[test]
    fn invocation_ids_are_unique() {
        assert_ne!(InvocationId::new_random(), InvocationId::new_random());
    }
}

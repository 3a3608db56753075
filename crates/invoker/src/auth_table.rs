//! Per-namespace auth-requirement tables.
//!
//! Each namespace may register a table mapping `"action/version"` to whether
//! that call needs a handshake. Anything not registered, whether the whole
//! namespace or a single entry, requires authentication.

use std::collections::HashMap;

use crate::{Action, Namespace, Version};

/// Namespace that hosts the login operations.
pub const AUTHENTICATION_NAMESPACE: &str = "Authentication";

fn entry_key(action: &str, version: &str) -> String {
    format!("{action}/{version}")
}

/// Declares which action+version pairs of one namespace need a handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequirementTable {
    entries: HashMap<String, bool>,
}

impl AuthRequirementTable {
    /// Creates an empty table; every lookup in it defaults to `true`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether `action/version` requires authentication.
    #[must_use]
    pub fn with(mut self, action: &str, version: &str, requires_auth: bool) -> Self {
        self.entries.insert(entry_key(action, version), requires_auth);
        self
    }

    /// Looks up an `"action/version"` key.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for AuthRequirementTable {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------

/// Statically registered mapping from namespace name to its table.
#[derive(Debug, Clone, Default)]
pub struct AuthRegistry {
    tables: HashMap<String, AuthRequirementTable>,
}

impl AuthRegistry {
    /// Creates a registry with no tables; every call requires authentication.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the registry of the known API surface.
    ///
    /// Only the login operations are exempt from authentication.
    pub fn builtin() -> Self {
        Self::empty().register(
            AUTHENTICATION_NAMESPACE,
            AuthRequirementTable::new()
                .with("login", "v2", false)
                .with("loginByToken", "v2", false),
        )
    }

    /// Registers (or replaces) the table for `namespace`.
    #[must_use]
    pub fn register(mut self, namespace: impl Into<String>, table: AuthRequirementTable) -> Self {
        self.tables.insert(namespace.into(), table);
        self
    }

    /// Returns the table registered for `namespace`, if any.
    pub fn table(&self, namespace: &Namespace) -> Option<&AuthRequirementTable> {
        self.tables.get(namespace.as_str())
    }

    /// Returns whether `namespace/action/version` requires a handshake.
    ///
    /// Missing namespaces and missing entries both yield `true`.
    pub fn requires_authentication(
        &self,
        namespace: &Namespace,
        action: &Action,
        version: &Version,
    ) -> bool {
        self.table(namespace)
            .and_then(|table| table.get(&entry_key(action.as_str(), version.as_str())))
            .unwrap_or(true)
    }
}

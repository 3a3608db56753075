//! Method string parsing and per-method authentication decisions.

use tracing::warn;

use crate::{Action, AuthRegistry, InvokeError, MethodIdentifier, Namespace, Version};

/// Parses method strings and answers whether a method needs a handshake.
///
/// Holds no mutable state; lookups never change the registry.
#[derive(Debug, Clone)]
pub struct MethodResolver {
    registry: AuthRegistry,
}

impl MethodResolver {
    /// Creates a resolver over `registry`.
    pub fn new(registry: AuthRegistry) -> Self {
        Self { registry }
    }

    /// Returns the auth-requirement registry.
    pub fn registry(&self) -> &AuthRegistry {
        &self.registry
    }

    /// Parses `method` into its `namespace/action/version` parts.
    ///
    /// One leading and one trailing `/` are stripped (not repeated ones), then
    /// the rest is split on `/`. The first three segments must be non-empty.
    /// Segments beyond the third are ignored.
    ///
    /// # Errors
    ///
    /// [`InvokeError::Validation`] if fewer than three non-empty segments remain.
    pub fn resolve(&self, method: &str) -> Result<MethodIdentifier, InvokeError> {
        let trimmed = method.strip_prefix('/').unwrap_or(method);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let mut segments = trimmed.split('/');
        let namespace = segments.next().and_then(Namespace::new);
        let action = segments.next().and_then(Action::new);
        let version = segments.next().and_then(Version::new);

        let (Some(namespace), Some(action), Some(version)) = (namespace, action, version) else {
            return Err(InvokeError::validation(method));
        };

        let extra = segments.count();
        if extra > 0 {
            warn!(method, extra, "ignoring trailing method segments");
        }

        Ok(MethodIdentifier {
            namespace,
            action,
            version,
        })
    }

    /// Returns whether `namespace/action/version` requires a handshake.
    pub fn requires_authentication(
        &self,
        namespace: &Namespace,
        action: &Action,
        version: &Version,
    ) -> bool {
        self.registry
            .requires_authentication(namespace, action, version)
    }
}

impl Default for MethodResolver {
    fn default() -> Self {
        Self::new(AuthRegistry::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(id: &MethodIdentifier) -> (&str, &str, &str) {
        (id.namespace.as_str(), id.action.as_str(), id.version.as_str())
    }

    #[test]
    fn extracts_segments_verbatim() {
        let resolver = MethodResolver::default();
        let id = resolver.resolve("Enduser/export/v3").unwrap();
        assert_eq!(parts(&id), ("Enduser", "export", "v3"));
    }

    #[test]
    fn strips_one_leading_and_trailing_slash() {
        let resolver = MethodResolver::default();
        let id = resolver.resolve("/Transaction/getService/v4/").unwrap();
        assert_eq!(parts(&id), ("Transaction", "getService", "v4"));
    }

    #[test]
    fn repeated_leading_slash_leaves_an_empty_namespace() {
        let resolver = MethodResolver::default();
        let err = resolver.resolve("//Enduser/export/v3").unwrap_err();
        assert!(matches!(err, InvokeError::Validation { ref method } if method == "//Enduser/export/v3"));
    }

    #[test]
    fn rejects_too_few_segments() {
        let resolver = MethodResolver::default();
        for method in ["", "/", "Enduser", "Enduser/export", "/Enduser/export/"] {
            assert!(
                matches!(resolver.resolve(method), Err(InvokeError::Validation { .. })),
                "{method:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_middle_segment() {
        let resolver = MethodResolver::default();
        assert!(resolver.resolve("Enduser//v3").is_err());
    }

    #[test]
    fn tolerates_extra_segments() {
        let resolver = MethodResolver::default();
        let id = resolver.resolve("Enduser/export/v3/extra/more").unwrap();
        assert_eq!(parts(&id), ("Enduser", "export", "v3"));
    }

    #[test]
    fn preserves_case() {
        let resolver = MethodResolver::default();
        let id = resolver.resolve("ENDUSER/Export/V3").unwrap();
        assert_eq!(parts(&id), ("ENDUSER", "Export", "V3"));
    }

    #[test]
    fn delegates_auth_decisions_to_registry() {
        let resolver = MethodResolver::default();
        let login = resolver.resolve("Authentication/login/v2").unwrap();
        let export = resolver.resolve("Enduser/export/v3").unwrap();

        assert!(!resolver.requires_authentication(&login.namespace, &login.action, &login.version));
        assert!(resolver.requires_authentication(&export.namespace, &export.action, &export.version));
    }
}

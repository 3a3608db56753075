//! The invocation orchestrator.
//!
//! [`Client::invoke`] resolves the method string, decides whether the call
//! needs a handshake, obtains one if so, and dispatches the request. Every
//! outcome, including a malformed method string, is delivered through the
//! returned future; `invoke` never fails before it is awaited.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info_span, Instrument};

use crate::{
    ApiResponse, AuthRegistry, AuthRequirementTable, BodyParser, ClientConfig, Clock, ConfigPatch,
    CredentialStore, HandshakeManager, InvocationId, InvokeError, LocalAddress, LoginInvoker,
    MethodResolver, Params, ParserRegistry, RequestDescriptor, RequestDispatcher, SystemClock,
    Transport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    /// Consult the auth-requirement registry.
    IfRequired,
    /// Never attach a handshake (login calls).
    Anonymous,
}

/// A configured API client.
///
/// Each client owns its configuration and its handshake cache. Cloning is not
/// supported; share a client behind an [`Arc`].
pub struct Client {
    config: RwLock<ClientConfig>,
    resolver: MethodResolver,
    handshake: HandshakeManager,
    dispatcher: RequestDispatcher,
}

impl Client {
    /// Starts building a client over the given collaborators.
    pub fn builder(
        transport: Arc<dyn Transport>,
        local_address: Arc<dyn LocalAddress>,
    ) -> ClientBuilder {
        ClientBuilder::new(transport, local_address)
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.config.read().clone()
    }

    /// Shallow-merges `patch` into the configuration.
    ///
    /// Invocations already in flight keep the snapshot they started with. The
    /// cached handshake is kept.
    pub fn configure(&self, patch: ConfigPatch) {
        let mut config = self.config.write();
        *config = config.clone().merge(patch);
        debug!(config = ?*config, "client reconfigured");
    }

    /// Returns the handshake cache.
    pub fn credential_store(&self) -> &CredentialStore {
        self.handshake.store()
    }

    /// Invokes `method` (`"namespace/action/version"`) with optional query `params`.
    ///
    /// # Errors
    ///
    /// Exactly one [`InvokeError`] on failure; see its variants. Nothing is
    /// retried.
    pub async fn invoke(
        &self,
        method: &str,
        params: Option<Params>,
    ) -> Result<ApiResponse, InvokeError> {
        let span = info_span!("invoke", invocation_id = %InvocationId::new_random(), method);
        self.execute(method, params, AuthMode::IfRequired)
            .instrument(span)
            .await
            .inspect_err(|e| debug!(method, error = %e, "invocation failed"))
    }

    async fn execute(
        &self,
        method: &str,
        params: Option<Params>,
        mode: AuthMode,
    ) -> Result<ApiResponse, InvokeError> {
        let config = self.config();
        let method = self.resolver.resolve(method)?;

        let requires_auth = match mode {
            AuthMode::Anonymous => false,
            AuthMode::IfRequired => self.resolver.requires_authentication(
                &method.namespace,
                &method.action,
                &method.version,
            ),
        };
        debug!(%method, requires_auth, "method resolved");

        let mut descriptor = RequestDescriptor::new(&config, method, params);
        if requires_auth {
            let auth = self.handshake.credential(&config, self).await?;
            descriptor = descriptor.with_auth(auth);
        }

        self.dispatcher.send(descriptor).await
    }
}

#[async_trait]
impl LoginInvoker for Client {
    async fn login(&self, method: &str, params: Params) -> Result<ApiResponse, InvokeError> {
        self.execute(method, Some(params), AuthMode::Anonymous)
            .await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &*self.config.read())
            .field("resolver", &self.resolver)
            .field("handshake", &self.handshake)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a [`Client`] from its collaborators.
///
/// Defaults: [`ClientConfig::default`], [`AuthRegistry::builtin`],
/// [`ParserRegistry::with_defaults`], [`SystemClock`] and a fresh
/// [`CredentialStore`].
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    local_address: Arc<dyn LocalAddress>,
    registry: AuthRegistry,
    parsers: ParserRegistry,
    clock: Arc<dyn Clock>,
    store: Arc<CredentialStore>,
}

impl ClientBuilder {
    /// Creates a builder with default settings.
    pub fn new(transport: Arc<dyn Transport>, local_address: Arc<dyn LocalAddress>) -> Self {
        Self {
            config: ClientConfig::default(),
            transport,
            local_address,
            registry: AuthRegistry::builtin(),
            parsers: ParserRegistry::with_defaults(),
            clock: Arc::new(SystemClock),
            store: Arc::new(CredentialStore::new()),
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Shallow-merges `patch` into the configuration.
    #[must_use]
    pub fn configure(mut self, patch: ConfigPatch) -> Self {
        self.config = self.config.merge(patch);
        self
    }

    /// Replaces the auth-requirement registry.
    #[must_use]
    pub fn auth_registry(mut self, registry: AuthRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers the auth-requirement table of one namespace.
    #[must_use]
    pub fn auth_table(mut self, namespace: impl Into<String>, table: AuthRequirementTable) -> Self {
        self.registry = self.registry.register(namespace, table);
        self
    }

    /// Registers an additional body parser.
    #[must_use]
    pub fn parser(mut self, parser: impl BodyParser + 'static) -> Self {
        self.parsers = self.parsers.register(parser);
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses `store` as the handshake cache.
    ///
    /// Clients given the same store share one session.
    #[must_use]
    pub fn credential_store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = store;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Client {
        Client {
            config: RwLock::new(self.config),
            resolver: MethodResolver::new(self.registry),
            handshake: HandshakeManager::new(self.store, self.clock, self.local_address),
            dispatcher: RequestDispatcher::new(self.transport, self.parsers),
        }
    }
}

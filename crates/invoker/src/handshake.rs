//! Handshake acquisition, caching and expiry.
//!
//! A handshake is a session token obtained by logging in. It is sent as the
//! password half of basic-auth credentials, paired with the configured
//! handshake user, on every authenticated call until it expires.
//!
//! The token lives in a [`CredentialStore`] owned by the client rather than in
//! process-wide state, so independent clients never share sessions.
//!
//! ## Refresh
//!
//! Reads are lock-free for callers that find a fresh token. Callers that miss
//! the cache queue on a refresh guard; the first performs the login and the
//! rest reuse its result, so concurrent misses produce a single login.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::{
    ApiResponse, BasicAuth, ClientConfig, Clock, Credentials, InvokeError, LocalAddress, Params,
};

/// Method used to log in with an account id and API token.
pub const LOGIN_BY_TOKEN_METHOD: &str = "Authentication/loginByToken/v2";

/// Method used to log in with user name, password and company id.
pub const LOGIN_METHOD: &str = "Authentication/login/v2";

// ---------------------------------------------------------------------------
// Credential and store
// ---------------------------------------------------------------------------

/// A handshake token and the instant it was obtained.
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeCredential {
    token: String,
    obtained_at: DateTime<Utc>,
}

impl HandshakeCredential {
    /// Creates a credential obtained at `obtained_at`.
    pub fn new(token: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            obtained_at,
        }
    }

    /// Returns the handshake token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns when the token was obtained.
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Returns `true` while `now - obtained_at < timeout`.
    ///
    /// A credential stamped in the future (clock stepped backwards) counts as
    /// fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        match now.signed_duration_since(self.obtained_at).to_std() {
            Ok(age) => age < timeout,
            Err(_) => true,
        }
    }
}

impl std::fmt::Debug for HandshakeCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeCredential")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Holds the current handshake of one client.
///
/// Credentials are replaced on refresh and expire implicitly; they are never
/// revoked.
#[derive(Debug, Default)]
pub struct CredentialStore {
    cached: RwLock<Option<HandshakeCredential>>,
    refresh: tokio::sync::Mutex<()>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached credential, fresh or not.
    pub fn current(&self) -> Option<HandshakeCredential> {
        self.cached.read().clone()
    }

    /// Returns the cached token if it is still fresh at `now`.
    pub fn fresh_token(&self, now: DateTime<Utc>, timeout: Duration) -> Option<String> {
        self.cached
            .read()
            .as_ref()
            .filter(|c| c.is_fresh(now, timeout))
            .map(|c| c.token.clone())
    }

    /// Replaces the cached credential.
    pub fn store(&self, credential: HandshakeCredential) {
        *self.cached.write() = Some(credential);
    }
}

// ---------------------------------------------------------------------------
// Token derivation
// ---------------------------------------------------------------------------

/// Derives the login token sent in place of the raw API token.
///
/// SHA-1 hex digest of the raw token followed by the Unix time in whole
/// seconds. Both sides must agree on the second, so the value changes every
/// second and is identical within one.
pub fn derive_token(token: &str, now: DateTime<Utc>) -> String {
    let digest = Sha1::digest(format!("{token}{}", now.timestamp()));
    hex::encode(digest)
}

/// Builds the login method and parameters for `credentials` at `now`.
///
/// The `ipAddress` parameter is added by the caller.
pub fn login_request(credentials: &Credentials, now: DateTime<Utc>) -> (&'static str, Params) {
    let mut params = Params::new();
    match credentials {
        Credentials::Token { account_id, token } => {
            params.insert("accountId".into(), Value::String(account_id.clone()));
            params.insert("token".into(), Value::String(derive_token(token, now)));
            (LOGIN_BY_TOKEN_METHOD, params)
        }
        Credentials::Password {
            username,
            password,
            company_id,
        } => {
            params.insert("username".into(), Value::String(username.clone()));
            params.insert("password".into(), Value::String(password.clone()));
            params.insert("companyId".into(), Value::String(company_id.clone()));
            (LOGIN_METHOD, params)
        }
    }
}

// Non-empty strings and numbers are usable tokens.
fn handshake_token(response: &ApiResponse) -> Option<String> {
    match response.result()? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Performs a login call through the invocation pipeline.
///
/// Implemented by [`crate::Client`]; login calls are always dispatched without
/// a handshake.
#[async_trait]
pub trait LoginInvoker: Send + Sync {
    /// Invokes the login `method` with `params`.
    async fn login(&self, method: &str, params: Params) -> Result<ApiResponse, InvokeError>;
}

/// Owns the handshake lifecycle of one client.
pub struct HandshakeManager {
    store: Arc<CredentialStore>,
    clock: Arc<dyn Clock>,
    local_address: Arc<dyn LocalAddress>,
}

impl HandshakeManager {
    /// Creates a manager over `store`.
    pub fn new(
        store: Arc<CredentialStore>,
        clock: Arc<dyn Clock>,
        local_address: Arc<dyn LocalAddress>,
    ) -> Self {
        Self {
            store,
            clock,
            local_address,
        }
    }

    /// Returns the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns basic-auth credentials pairing the handshake user with a fresh token.
    ///
    /// Uses the cached token while it is fresh; otherwise logs in through
    /// `invoker` and caches the result.
    ///
    /// # Errors
    ///
    /// - [`InvokeError::Credential`] when `config` has no usable credentials;
    ///   no call is made.
    /// - [`InvokeError::LocalAddress`] when the local IP lookup fails.
    /// - [`InvokeError::Authentication`] when the login response has no usable
    ///   `result`.
    /// - Any error of the login call itself.
    ///
    /// Nothing is cached on failure.
    pub async fn credential(
        &self,
        config: &ClientConfig,
        invoker: &dyn LoginInvoker,
    ) -> Result<BasicAuth, InvokeError> {
        let timeout = config.handshake_timeout();

        if let Some(token) = self.store.fresh_token(self.clock.now(), timeout) {
            debug!("using cached handshake");
            return Ok(basic_auth(config, token));
        }

        let _refresh = self.store.refresh.lock().await;

        // Another caller may have refreshed while this one waited.
        if let Some(token) = self.store.fresh_token(self.clock.now(), timeout) {
            debug!("using handshake refreshed by a concurrent caller");
            return Ok(basic_auth(config, token));
        }

        let token = self.login(config, invoker).await?;
        Ok(basic_auth(config, token))
    }

    async fn login(
        &self,
        config: &ClientConfig,
        invoker: &dyn LoginInvoker,
    ) -> Result<String, InvokeError> {
        let credentials = config.credentials().ok_or(InvokeError::Credential)?;

        let (method, mut params) = login_request(&credentials, self.clock.now());
        let ip = self.local_address.local_ip()?;
        params.insert("ipAddress".into(), Value::String(ip.to_string()));

        info!(method, "requesting new handshake");
        let response = invoker.login(method, params).await.inspect_err(|e| {
            warn!(method, error = %e, "login failed");
        })?;

        let Some(token) = handshake_token(&response) else {
            warn!(method, "login response carried no handshake");
            return Err(InvokeError::Authentication {
                response: response.into_value(),
            });
        };

        self.store
            .store(HandshakeCredential::new(token.clone(), self.clock.now()));
        info!(method, "handshake cached");
        Ok(token)
    }
}

impl std::fmt::Debug for HandshakeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeManager")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn basic_auth(config: &ClientConfig, token: String) -> BasicAuth {
    BasicAuth {
        user: config.handshake_user.clone(),
        password: token,
    }
}

//! Client configuration and its shallow-merge reconfiguration.
//!
//! [`ClientConfig`] is a plain structured object. It is replaced only through
//! [`ClientConfig::merge`], which applies a [`ConfigPatch`] key by key: every
//! key present in the patch wins, every absent key keeps its current value.
//!
//! Credentials are held as flat optional keys, the same way the merge sees
//! them. [`ClientConfig::credentials`] derives which of the two credential
//! shapes is usable.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::InvokeError;

/// Default API host.
pub const DEFAULT_API_HOST: &str = "rest-api.pay.nl";

/// Default basic-auth user name paired with the handshake token.
pub const DEFAULT_HANDSHAKE_USER: &str = "handshake";

/// Default handshake lifetime in seconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 3600;

/// Default response format.
pub const DEFAULT_RESPONSE_FORMAT: &str = "json";

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

/// URL scheme used to reach the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProtocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl ApiProtocol {
    /// Returns the URL scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::fmt::Display for ApiProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiProtocol {
    type Err = InvokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(InvokeError::Configuration {
                message: format!("unsupported API protocol '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The credential shape used to obtain a handshake.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Log in with an account id and a long-lived API token.
    ///
    /// The raw token is never sent; a derived token is sent instead.
    Token {
        /// Account identifier.
        account_id: String,
        /// Long-lived API token.
        token: String,
    },
    /// Log in with a user name, password and company id.
    Password {
        /// Login user name.
        username: String,
        /// Login password.
        password: String,
        /// Company identifier.
        company_id: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token { account_id, .. } => f
                .debug_struct("Token")
                .field("account_id", account_id)
                .field("token", &"<redacted>")
                .finish(),
            Self::Password {
                username,
                company_id,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("company_id", company_id)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`crate::Client`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// API host name, optionally with a port (e.g. `"rest-api.pay.nl"`).
    #[serde(alias = "apiUrl")]
    pub api_host: String,
    /// URL scheme.
    pub api_protocol: ApiProtocol,
    /// Name of the response format; selects the body parser.
    pub response_format: String,
    /// Basic-auth user name sent alongside the handshake token.
    pub handshake_user: String,
    /// Handshake lifetime in seconds.
    #[serde(rename = "handshakeTimeout")]
    pub handshake_timeout_secs: u64,
    /// Account id for token login.
    pub account_id: Option<String>,
    /// Long-lived API token for token login.
    pub token: Option<String>,
    /// User name for password login.
    pub username: Option<String>,
    /// Password for password login.
    pub password: Option<String>,
    /// Company id for password login.
    pub company_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_owned(),
            api_protocol: ApiProtocol::default(),
            response_format: DEFAULT_RESPONSE_FORMAT.to_owned(),
            handshake_user: DEFAULT_HANDSHAKE_USER.to_owned(),
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            account_id: None,
            token: None,
            username: None,
            password: None,
            company_id: None,
        }
    }
}

impl ClientConfig {
    /// Returns the handshake lifetime.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Derives the usable credential shape, if any.
    ///
    /// Token credentials take precedence when both shapes are complete. Empty
    /// strings count as absent.
    pub fn credentials(&self) -> Option<Credentials> {
        if let (Some(account_id), Some(token)) = (present(&self.account_id), present(&self.token)) {
            return Some(Credentials::Token {
                account_id: account_id.to_owned(),
                token: token.to_owned(),
            });
        }

        match (
            present(&self.username),
            present(&self.password),
            present(&self.company_id),
        ) {
            (Some(username), Some(password), Some(company_id)) => Some(Credentials::Password {
                username: username.to_owned(),
                password: password.to_owned(),
                company_id: company_id.to_owned(),
            }),
            _ => None,
        }
    }

    /// Applies `patch` as a shallow merge: present keys win.
    #[must_use]
    pub fn merge(mut self, patch: ConfigPatch) -> Self {
        if let Some(v) = patch.api_host {
            self.api_host = v;
        }
        if let Some(v) = patch.api_protocol {
            self.api_protocol = v;
        }
        if let Some(v) = patch.response_format {
            self.response_format = v;
        }
        if let Some(v) = patch.handshake_user {
            self.handshake_user = v;
        }
        if let Some(v) = patch.handshake_timeout_secs {
            self.handshake_timeout_secs = v;
        }
        if patch.account_id.is_some() {
            self.account_id = patch.account_id;
        }
        if patch.token.is_some() {
            self.token = patch.token;
        }
        if patch.username.is_some() {
            self.username = patch.username;
        }
        if patch.password.is_some() {
            self.password = patch.password;
        }
        if patch.company_id.is_some() {
            self.company_id = patch.company_id;
        }
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_host", &self.api_host)
            .field("api_protocol", &self.api_protocol)
            .field("response_format", &self.response_format)
            .field("handshake_user", &self.handshake_user)
            .field("handshake_timeout_secs", &self.handshake_timeout_secs)
            .field("account_id", &self.account_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("company_id", &self.company_id)
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// A partial configuration, applied with [`ClientConfig::merge`].
///
/// Deserialises from the same camelCase keys as [`ClientConfig`], so a config
/// file may name only the keys it wants to change.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    #[serde(alias = "apiUrl")]
    pub api_host: Option<String>,
    pub api_protocol: Option<ApiProtocol>,
    pub response_format: Option<String>,
    pub handshake_user: Option<String>,
    #[serde(rename = "handshakeTimeout")]
    pub handshake_timeout_secs: Option<u64>,
    pub account_id: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub company_id: Option<String>,
}

impl std::fmt::Debug for ConfigPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigPatch")
            .field("api_host", &self.api_host)
            .field("api_protocol", &self.api_protocol)
            .field("response_format", &self.response_format)
            .field("handshake_user", &self.handshake_user)
            .field("handshake_timeout_secs", &self.handshake_timeout_secs)
            .field("account_id", &self.account_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("company_id", &self.company_id)
            .finish()
    }
}

impl ConfigPatch {
    /// Reads a patch from `PAYNL_*` environment variables.
    pub fn from_env() -> Result<Self, InvokeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a patch from an arbitrary key lookup using the `PAYNL_*` names.
    ///
    /// Unset keys are left absent. Malformed protocol or timeout values are
    /// rejected with [`InvokeError::Configuration`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InvokeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_protocol = lookup("PAYNL_API_PROTOCOL")
            .map(|v| v.parse::<ApiProtocol>())
            .transpose()?;
        let handshake_timeout_secs = lookup("PAYNL_HANDSHAKE_TIMEOUT")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|e| InvokeError::Configuration {
                    message: format!("PAYNL_HANDSHAKE_TIMEOUT must be a number of seconds: {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            api_host: lookup("PAYNL_API_HOST"),
            api_protocol,
            response_format: lookup("PAYNL_RESPONSE_FORMAT"),
            handshake_user: lookup("PAYNL_HANDSHAKE_USER"),
            handshake_timeout_secs,
            account_id: lookup("PAYNL_ACCOUNT_ID"),
            token: lookup("PAYNL_TOKEN"),
            username: lookup("PAYNL_USERNAME"),
            password: lookup("PAYNL_PASSWORD"),
            company_id: lookup("PAYNL_COMPANY_ID"),
        })
    }

    /// Combines two patches; keys present in `other` win.
    #[must_use]
    pub fn and_then(self, other: Self) -> Self {
        Self {
            api_host: other.api_host.or(self.api_host),
            api_protocol: other.api_protocol.or(self.api_protocol),
            response_format: other.response_format.or(self.response_format),
            handshake_user: other.handshake_user.or(self.handshake_user),
            handshake_timeout_secs: other.handshake_timeout_secs.or(self.handshake_timeout_secs),
            account_id: other.account_id.or(self.account_id),
            token: other.token.or(self.token),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            company_id: other.company_id.or(self.company_id),
        }
    }
}

//! Outbound request descriptors and canonical URL construction.
//!
//! The canonical form is
//! `{protocol}://{host}/{version}/{namespace}/{action}/{format}?{query}`.
//! Credentials travel beside the URL as [`BasicAuth`], never inside it.

use serde_json::{Map, Value};
use url::form_urlencoded::Serializer;
use url::{Url, UrlQuery};

use crate::{ApiProtocol, BasicAuth, ClientConfig, InvokeError, MethodIdentifier, OutboundRequest};

/// Call parameters, sent as the query string.
pub type Params = Map<String, Value>;

/// Everything needed to build one outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// URL scheme.
    pub protocol: ApiProtocol,
    /// API host, optionally with a port.
    pub host: String,
    /// The remote operation.
    pub method: MethodIdentifier,
    /// Response format; last path segment and parser selector.
    pub format: String,
    /// Query parameters.
    pub query: Params,
    /// Handshake credentials, when the call is authenticated.
    pub auth: Option<BasicAuth>,
}

impl RequestDescriptor {
    /// Creates an unauthenticated descriptor for `method` under `config`.
    pub fn new(config: &ClientConfig, method: MethodIdentifier, params: Option<Params>) -> Self {
        Self {
            protocol: config.api_protocol,
            host: config.api_host.clone(),
            method,
            format: config.response_format.clone(),
            query: params.unwrap_or_default(),
            auth: None,
        }
    }

    /// Attaches handshake credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Returns the path without a leading slash: `version/namespace/action/format`.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.method.version, self.method.namespace, self.method.action, self.format
        )
    }

    /// Builds the canonical request URL.
    ///
    /// # Errors
    ///
    /// [`InvokeError::Configuration`] when the host does not form a bare
    /// `scheme://host[:port]` base.
    pub fn url(&self) -> Result<Url, InvokeError> {
        let base = format!("{}://{}/", self.protocol, self.host);
        let mut url = Url::parse(&base).map_err(|e| InvokeError::Configuration {
            message: format!("invalid API host '{}': {e}", self.host),
        })?;
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(InvokeError::Configuration {
                message: format!("API host '{}' must not contain a path or query", self.host),
            });
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(InvokeError::Configuration {
                message: format!("API host '{}' must not embed credentials", self.host),
            });
        }

        url.path_segments_mut()
            .map_err(|()| InvokeError::Configuration {
                message: format!("API host '{}' cannot carry a path", self.host),
            })?
            .clear()
            .extend([
                self.method.version.as_str(),
                self.method.namespace.as_str(),
                self.method.action.as_str(),
                self.format.as_str(),
            ]);

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                append_query(&mut pairs, key, value);
            }
        }

        Ok(url)
    }

    /// Converts into the transport-facing request.
    pub fn into_outbound(self) -> Result<OutboundRequest, InvokeError> {
        let url = self.url()?;
        Ok(OutboundRequest {
            url: url.into(),
            auth: self.auth,
        })
    }
}

// Scalars render as text, null as empty, arrays as repeated keys and nested
// objects as empty values.
fn append_query(pairs: &mut Serializer<'_, UrlQuery<'_>>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                pairs.append_pair(key, &scalar_text(item));
            }
        }
        other => {
            pairs.append_pair(key, &scalar_text(other));
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MethodResolver;

    fn descriptor(config: &ClientConfig, method: &str, params: Value) -> RequestDescriptor {
        let method = MethodResolver::default().resolve(method).unwrap();
        let params = match params {
            Value::Object(map) => Some(map),
            _ => None,
        };
        RequestDescriptor::new(config, method, params)
    }

    #[test]
    fn builds_canonical_url() {
        let d = descriptor(&ClientConfig::default(), "Enduser/export/v3", json!({"id": 7}));
        assert_eq!(d.path(), "v3/Enduser/export/json");
        assert_eq!(
            d.url().unwrap().as_str(),
            "https://rest-api.pay.nl/v3/Enduser/export/json?id=7"
        );
    }

    #[test]
    fn omits_query_when_there_are_no_params() {
        let d = descriptor(&ClientConfig::default(), "Enduser/export/v3", Value::Null);
        assert_eq!(
            d.url().unwrap().as_str(),
            "https://rest-api.pay.nl/v3/Enduser/export/json"
        );
    }

    #[test]
    fn honours_protocol_host_port_and_format() {
        let config = ClientConfig {
            api_protocol: ApiProtocol::Http,
            api_host: "127.0.0.1:8080".into(),
            response_format: "xml".into(),
            ..ClientConfig::default()
        };
        let d = descriptor(&config, "Transaction/info/v5", json!({}));
        assert_eq!(
            d.url().unwrap().as_str(),
            "http://127.0.0.1:8080/v5/Transaction/info/xml"
        );
    }

    #[test]
    fn encodes_query_values() {
        let d = descriptor(
            &ClientConfig::default(),
            "Enduser/export/v3",
            json!({
                "name": "a b&c",
                "flag": true,
                "none": null,
                "ids": [1, 2],
                "nested": {"x": 1}
            }),
        );
        let url = d.url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("name".into(), "a b&c".into())));
        assert!(pairs.contains(&("flag".into(), "true".into())));
        assert!(pairs.contains(&("none".into(), String::new())));
        assert!(pairs.contains(&("ids".into(), "1".into())));
        assert!(pairs.contains(&("ids".into(), "2".into())));
        assert!(pairs.contains(&("nested".into(), String::new())));
    }

    #[test]
    fn credentials_stay_out_of_the_url() {
        let d = descriptor(&ClientConfig::default(), "Enduser/export/v3", json!({}))
            .with_auth(BasicAuth {
                user: "handshake".into(),
                password: "tok123".into(),
            });
        let outbound = d.into_outbound().unwrap();
        assert!(!outbound.url.contains("tok123"));
        assert_eq!(
            outbound.auth.map(|a| a.to_pair()),
            Some("handshake:tok123".to_owned())
        );
    }

    #[test]
    fn rejects_host_with_path() {
        let config = ClientConfig {
            api_host: "rest-api.pay.nl/prefix".into(),
            ..ClientConfig::default()
        };
        let d = descriptor(&config, "Enduser/export/v3", Value::Null);
        assert!(matches!(d.url(), Err(InvokeError::Configuration { .. })));
    }
}

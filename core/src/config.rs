//! Client configuration and credentials.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::MapiError;

pub const DEFAULT_HOST: &str = "api.criteo.com";
pub const DEFAULT_PROTOCOL: &str = "https";
/// Per-request ceiling enforced by the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// OAuth2 client-credentials pair. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read `MAPI_CLIENT_ID` and `MAPI_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self, MapiError> {
        Ok(Self::new(
            required_var("MAPI_CLIENT_ID")?,
            required_var("MAPI_CLIENT_SECRET")?,
        ))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Where and how the client talks to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub protocol: String,
    /// Host, optionally with a port (`127.0.0.1:8080`).
    pub host: String,
    /// Prefix prepended to every request path, including the token endpoint.
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
            endpoint: String::new(),
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `MAPI_HOST`, `MAPI_ENDPOINT` and `MAPI_PROTOCOL`.
    pub fn from_env() -> Result<Self, MapiError> {
        let mut config = Self::default();
        if let Some(host) = optional_var("MAPI_HOST") {
            config = config.host(host);
        }
        if let Some(endpoint) = optional_var("MAPI_ENDPOINT") {
            config = config.endpoint(endpoint);
        }
        if let Some(protocol) = optional_var("MAPI_PROTOCOL") {
            if protocol != "http" && protocol != "https" {
                return Err(MapiError::Config(format!(
                    "MAPI_PROTOCOL must be http or https, got {protocol:?}"
                )));
            }
            config = config.protocol(protocol);
        }
        Ok(config)
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn default_user_agent() -> String {
    format!("mapi-rust-client/{}", env!("CARGO_PKG_VERSION"))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_var(name: &str) -> Result<String, MapiError> {
    optional_var(name).ok_or_else(|| MapiError::Config(format!("{name} is not set")))
}

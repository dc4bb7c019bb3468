//! Error types for the marketing API client.
//!
//! # Design
//! `TransportError` describes a single failed round-trip: either the
//! connection never produced a response, or the response carried an error
//! status. The pipeline is the only place that looks at `status_code` to
//! decide whether to refresh the token and retry; everything it gives up
//! on is wrapped in `MapiError::Pipeline`.

use std::path::PathBuf;

use thiserror::Error;

/// What went wrong on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection could not be established or broke mid-flight.
    Connect,
    /// The request exceeded the transport timeout.
    Timeout,
    /// The server answered with a 4xx/5xx status.
    Status,
}

/// A failed HTTP round-trip.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Set when the server answered; `None` for connection-level failures.
    pub status_code: Option<u16>,
}

impl TransportError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connect,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body}")
        };
        Self {
            kind: TransportErrorKind::Status,
            message,
            status_code: Some(status),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }
}

/// Failures while obtaining an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint unreachable: {0}")]
    Transport(#[source] TransportError),

    #[error("token endpoint rejected credentials: {0}")]
    Rejected(#[source] TransportError),

    #[error("token response is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("token response has no access_token")]
    MissingAccessToken,
}

impl AuthError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AuthError::Transport(err) | AuthError::Rejected(err) => err.status_code,
            _ => None,
        }
    }
}

/// Errors returned by `MapiClient`.
#[derive(Debug, Error)]
pub enum MapiError {
    /// Token acquisition failed; never retried.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The request failed and the pipeline will not retry it.
    #[error("[MAPI Request Failed] {0}")]
    Pipeline(#[source] TransportError),

    /// A report could not be saved to disk.
    #[error("could not save report to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A response body could not be decoded as the expected JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A date argument could not be understood.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MapiError {
    /// HTTP status attached to the failure, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MapiError::Pipeline(err) => err.status_code,
            MapiError::Authentication(err) => err.status_code(),
            _ => None,
        }
    }
}

//! Executes a single `HttpRequest` over the network.
//!
//! # Design
//! A transport performs exactly one round-trip and never retries. Any
//! status the server sends back, 4xx and 5xx included, is returned as an
//! `HttpResponse`; only failures that produce no response at all (refused
//! connection, DNS, TLS, timeout) become `TransportError`. Deciding what a
//! 401 means is left to the pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::config::DEFAULT_TIMEOUT;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Report downloads can exceed ureq's default 10 MB body limit.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Something that can execute an `HttpRequest`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a ureq `Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url();
        debug!(method = %request.method, %url, bytes = request.body.len(), "sending request");

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = if request.body.is_empty() {
            builder
                .body(())
                .map_err(invalid_request)
                .and_then(|req| self.agent.run(req).map_err(classify))
        } else {
            builder
                .body(request.body.as_slice())
                .map_err(invalid_request)
                .and_then(|req| self.agent.run(req).map_err(classify))
        };

        let mut response = match result {
            Ok(response) => response,
            Err(err) => {
                debug!(method = %request.method, %url, error = %err, "request failed");
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            headers.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(classify)?;

        debug!(method = %request.method, %url, status, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn invalid_request(err: ureq::http::Error) -> TransportError {
    TransportError::connect(format!("invalid request: {err}"))
}

fn classify(err: ureq::Error) -> TransportError {
    match &err {
        ureq::Error::Timeout(_) => TransportError::timeout(err.to_string()),
        _ => TransportError::connect(err.to_string()),
    }
}

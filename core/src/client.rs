//! The authenticated request pipeline.
//!
//! # Design
//! Every API call goes through [`MapiClient::request`]. A call moves through
//! four states: it may need a token, it is sent authenticated, it may be
//! re-sent once after a 401 with a freshly issued token, or it fails.
//!
//! - Tokens are fetched lazily on the first call and reused until the server
//!   rejects one. There is no client-side expiry clock.
//! - A 401 triggers exactly one refresh-and-retry. A second 401, or any other
//!   error status, ends the call with `MapiError::Pipeline`.
//! - The token endpoint itself is never authenticated and a 401 from it is
//!   terminal, so authentication can't recurse.
//! - The retry is a bounded loop over attempts, not recursion.

use tracing::{debug, info, warn};

use crate::auth::{parse_token_response, token_request_params, Token, TokenCache, TOKEN_PATH};
use crate::builder::{ApiRequest, RequestBuilder};
use crate::config::{ClientConfig, Credentials};
use crate::error::{AuthError, MapiError, TransportError};
use crate::http::{HttpMethod, HttpResponse, Payload};
use crate::transport::{Transport, UreqTransport};

/// How many times a call is re-sent after a 401.
pub const MAX_UNAUTHORIZED_RETRIES: u32 = 1;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Client for the marketing API.
///
/// Safe to share between threads; the token slot is mutex-guarded and
/// refreshes are single-flight.
#[derive(Debug)]
pub struct MapiClient<T = UreqTransport> {
    credentials: Credentials,
    config: ClientConfig,
    builder: RequestBuilder,
    transport: T,
    tokens: TokenCache,
}

impl MapiClient<UreqTransport> {
    /// Client for the production API with default settings.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_config(
            Credentials::new(client_id, client_secret),
            ClientConfig::default(),
        )
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(credentials, config, transport)
    }

    /// Credentials and config from `MAPI_*` environment variables.
    pub fn from_env() -> Result<Self, MapiError> {
        Ok(Self::with_config(
            Credentials::from_env()?,
            ClientConfig::from_env()?,
        ))
    }
}

impl<T: Transport> MapiClient<T> {
    pub fn with_transport(credentials: Credentials, config: ClientConfig, transport: T) -> Self {
        let builder = RequestBuilder::new(&config.host, &config.endpoint);
        Self {
            credentials,
            config,
            builder,
            transport,
            tokens: TokenCache::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The token currently held, if any.
    pub fn token(&self) -> Option<Token> {
        self.tokens.current()
    }

    /// Fetch a new token and make it the current one.
    pub fn authenticate(&self) -> Result<Token, MapiError> {
        let mut state = self.tokens.lock();
        let token = self.fetch_token()?;
        state.store(token.clone());
        Ok(token)
    }

    pub fn get(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse, MapiError> {
        self.request(HttpMethod::Get, path, payload.into())
    }

    pub fn post(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse, MapiError> {
        self.request(HttpMethod::Post, path, payload.into())
    }

    pub fn put(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse, MapiError> {
        self.request(HttpMethod::Put, path, payload.into())
    }

    pub fn patch(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse, MapiError> {
        self.request(HttpMethod::Patch, path, payload.into())
    }

    pub fn delete(&self, path: &str, payload: impl Into<Payload>) -> Result<HttpResponse, MapiError> {
        self.request(HttpMethod::Delete, path, payload.into())
    }

    /// Send an API call, authenticating first if needed and retrying once
    /// with a fresh token on 401.
    ///
    /// Returns the raw response for any 2xx/3xx status.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Payload,
    ) -> Result<HttpResponse, MapiError> {
        let is_token_path = path == TOKEN_PATH;
        let mut attempt = 0;
        let mut rejected_generation = None;

        loop {
            let bearer = if is_token_path {
                None
            } else {
                Some(self.bearer(rejected_generation)?)
            };

            let api = self.api_request(path, &payload, bearer.as_ref().map(|(token, _)| token));
            let req = self.builder.build(method, &api);

            match self.transport.send(&req).and_then(check_status) {
                Ok(response) => return Ok(response),
                Err(err)
                    if err.is_unauthorized()
                        && !is_token_path
                        && attempt < MAX_UNAUTHORIZED_RETRIES =>
                {
                    warn!(%method, path, attempt, "request unauthorized, refreshing token");
                    attempt += 1;
                    rejected_generation = bearer.map(|(_, generation)| generation);
                }
                Err(err) => {
                    debug!(%method, path, attempt, error = %err, "request failed");
                    return Err(MapiError::Pipeline(err));
                }
            }
        }
    }

    /// Token to send with the next attempt.
    ///
    /// `rejected` is the generation of a token the server just refused. It is
    /// only replaced if it is still current; otherwise another caller already
    /// refreshed it and the newer token is used as-is.
    fn bearer(&self, rejected: Option<u64>) -> Result<(Token, u64), MapiError> {
        let mut state = self.tokens.lock();
        if let Some(token) = &state.token {
            if rejected != Some(state.generation) {
                return Ok((token.clone(), state.generation));
            }
        }
        let token = self.fetch_token()?;
        state.store(token.clone());
        Ok((token, state.generation))
    }

    fn fetch_token(&self) -> Result<Token, AuthError> {
        let api = ApiRequest {
            protocol: Some(self.config.protocol.clone()),
            path: Some(TOKEN_PATH.to_string()),
            headers: vec![
                ("Accept".to_string(), JSON.to_string()),
                ("Content-Type".to_string(), FORM.to_string()),
                ("User-Agent".to_string(), self.config.user_agent.clone()),
            ],
            body: Payload::Params(token_request_params(&self.credentials)),
        };
        let req = self.builder.build(HttpMethod::Post, &api);

        let response = self.transport.send(&req).map_err(AuthError::Transport)?;
        if !response.is_success() {
            return Err(AuthError::Rejected(TransportError::status(
                response.status,
                &response.text(),
            )));
        }
        let token = parse_token_response(&response)?;
        info!(client_id = self.credentials.client_id(), "obtained access token");
        Ok(token)
    }

    fn api_request(&self, path: &str, payload: &Payload, token: Option<&Token>) -> ApiRequest {
        let mut headers = Vec::with_capacity(4);
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), token.authorization_header()));
        }
        headers.push(("Accept".to_string(), JSON.to_string()));
        headers.push(("Content-Type".to_string(), JSON.to_string()));
        headers.push(("User-Agent".to_string(), self.config.user_agent.clone()));

        ApiRequest {
            protocol: Some(self.config.protocol.clone()),
            path: Some(path.to_string()),
            headers,
            body: payload.clone(),
        }
    }
}

/// Treat 4xx/5xx answers as failures so the pipeline can inspect the code.
fn check_status(response: HttpResponse) -> Result<HttpResponse, TransportError> {
    if response.status >= 400 {
        return Err(TransportError::status(response.status, &response.text()));
    }
    Ok(response)
}

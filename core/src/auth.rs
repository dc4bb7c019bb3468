//! OAuth2 client-credentials token handling.
//!
//! # Design
//! The API issues opaque bearer tokens without a TTL the client can rely on,
//! so a `Token` carries no expiry. `TokenCache` keeps the current token
//! behind a mutex together with a generation counter: a caller that saw a
//! 401 reports the generation it used, and only refreshes if nobody else
//! has replaced that token in the meantime. Concurrent 401s for the same
//! stale token therefore produce a single token request.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde::Deserialize;

use crate::config::Credentials;
use crate::error::AuthError;
use crate::http::{HttpResponse, Params};

/// Path of the token-issuance endpoint, relative to the base path.
pub const TOKEN_PATH: &str = "/oauth2/token";

const GRANT_TYPE: &str = "client_credentials";

/// A bearer token as returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    obtained_at: SystemTime,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            obtained_at: SystemTime::now(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn obtained_at(&self) -> SystemTime {
        self.obtained_at
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Form fields for the client-credentials grant, in wire order.
pub fn token_request_params(credentials: &Credentials) -> Params {
    let mut params = Params::new();
    params
        .push("client_id", credentials.client_id())
        .push("client_secret", credentials.client_secret())
        .push("grant_type", GRANT_TYPE);
    params
}

/// Extract the token from a successful token-endpoint response.
pub fn parse_token_response(response: &HttpResponse) -> Result<Token, AuthError> {
    let parsed: TokenResponse =
        serde_json::from_slice(&response.body).map_err(AuthError::MalformedResponse)?;
    match parsed.access_token {
        Some(token) if !token.is_empty() => Ok(Token::new(token)),
        _ => Err(AuthError::MissingAccessToken),
    }
}

/// The current token and how many times it has been replaced.
#[derive(Debug, Default)]
pub struct TokenState {
    pub token: Option<Token>,
    pub generation: u64,
}

impl TokenState {
    pub fn store(&mut self, token: Token) {
        self.token = Some(token);
        self.generation += 1;
    }
}

/// Mutex-guarded token slot shared by every request on a client.
#[derive(Debug, Default)]
pub struct TokenCache {
    state: Mutex<TokenState>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the slot. Holding the guard across a token request is what makes
    /// refreshes single-flight.
    pub fn lock(&self) -> MutexGuard<'_, TokenState> {
        // A panic mid-refresh leaves either the old or the new token, both usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current token.
    pub fn current(&self) -> Option<Token> {
        self.lock().token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_params_are_in_wire_order() {
        let params = token_request_params(&Credentials::new("A", "B"));
        assert_eq!(
            params.encode(),
            "client_id=A&client_secret=B&grant_type=client_credentials"
        );
    }

    #[test]
    fn parses_access_token() {
        let response = HttpResponse::new(
            200,
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":300}"#,
        );
        let token = parse_token_response(&response).unwrap();
        assert_eq!(token.access_token(), "abc");
        assert_eq!(token.authorization_header(), "Bearer abc");
    }

    #[test]
    fn missing_or_empty_access_token_is_rejected() {
        for body in [r#"{"token_type":"Bearer"}"#, r#"{"access_token":""}"#] {
            let err = parse_token_response(&HttpResponse::new(200, body)).unwrap_err();
            assert!(matches!(err, AuthError::MissingAccessToken), "{body}");
        }
    }

    #[test]
    fn non_json_token_response_is_malformed() {
        let err = parse_token_response(&HttpResponse::new(200, "<html>")).unwrap_err();
        assert!(matches!(err, AuthError::MalformedResponse(_)));
    }

    #[test]
    fn storing_a_token_bumps_generation() {
        let cache = TokenCache::new();
        assert!(cache.current().is_none());
        cache.lock().store(Token::new("one"));
        cache.lock().store(Token::new("two"));
        let state = cache.lock();
        assert_eq!(state.generation, 2);
        assert_eq!(state.token.as_ref().unwrap().access_token(), "two");
    }

    #[test]
    fn debug_redacts_token() {
        let printed = format!("{:?}", Token::new("secret-token"));
        assert!(!printed.contains("secret-token"));
    }
}

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use axum::{
    body::Bytes,
    extract::{Form, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

pub const TOKEN_PATH: &str = "/oauth2/token";
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Deserialize)]
pub struct TokenForm {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// What an unmatched `/v1` route answers: a description of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Value,
}

struct Inner {
    client_id: String,
    client_secret: String,
    tokens: RwLock<HashSet<String>>,
    issued: AtomicUsize,
    unauthorized: AtomicUsize,
}

/// Shared state of the mock API. Cloning shares the same token store, so a
/// test can keep a handle and revoke tokens while the server runs.
#[derive(Clone)]
pub struct MockState {
    inner: Arc<Inner>,
}

impl MockState {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                tokens: RwLock::new(HashSet::new()),
                issued: AtomicUsize::new(0),
                unauthorized: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of tokens handed out so far.
    pub fn tokens_issued(&self) -> usize {
        self.inner.issued.load(Ordering::SeqCst)
    }

    /// Number of `/v1` requests rejected with 401.
    pub fn unauthorized_count(&self) -> usize {
        self.inner.unauthorized.load(Ordering::SeqCst)
    }

    /// Invalidate every issued token, as if they all expired.
    pub fn revoke_tokens(&self) {
        let mut tokens = self.inner.tokens.write().unwrap_or_else(|e| e.into_inner());
        debug!(count = tokens.len(), "revoking tokens");
        tokens.clear();
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.inner
            .tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(token)
    }

    fn issue_token(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner
            .tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone());
        self.inner.issued.fetch_add(1, Ordering::SeqCst);
        token
    }
}

pub fn app(state: MockState) -> Router {
    let v1 = Router::new()
        .route("/v1/{*rest}", any(dispatch))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route(TOKEN_PATH, post(issue_token))
        .merge(v1)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn issue_token(State(state): State<MockState>, Form(form): Form<TokenForm>) -> Response {
    if form.grant_type != "client_credentials" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response();
    }
    if form.client_id != state.inner.client_id || form.client_secret != state.inner.client_secret {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }
    let token = state.issue_token();
    info!(client_id = %form.client_id, "issued token");
    Json(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: 300,
    })
    .into_response()
}

async fn require_bearer(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let authorized = bearer_token(request.headers()).is_some_and(|token| state.is_valid(token));
    if !authorized {
        state.inner.unauthorized.fetch_add(1, Ordering::SeqCst);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_token"})),
        )
            .into_response();
    }
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn dispatch(
    method: Method,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    let path = uri.path();

    if method == Method::POST && (path == "/v1/statistics" || path == "/v1/sellers/stats") {
        return report(&body);
    }
    // `/v1/status/{code}` answers with that status, for exercising error paths.
    if let Some(code) = path.strip_prefix("/v1/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(json!({"error": status.as_str()}))).into_response();
    }

    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    Json(Echo {
        method: method.to_string(),
        path: path.to_string(),
        query,
        body,
    })
    .into_response()
}

/// A BOM-prefixed report in the format the query asked for.
fn report(body: &[u8]) -> Response {
    let query: Value = match serde_json::from_slice(body) {
        Ok(query) => query,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let format = query["format"].as_str().unwrap_or("CSV").to_ascii_lowercase();
    let start = query["startDate"].as_str().unwrap_or_default();

    let (content_type, content) = if format == "json" {
        let rows = json!([{"Day": start, "Clicks": 3, "Displays": 120}]);
        ("application/json", rows.to_string().into_bytes())
    } else {
        ("text/csv", format!("Day;Clicks;Displays\n{start};3;120\n").into_bytes())
    };

    let mut bytes = UTF8_BOM.to_vec();
    bytes.extend_from_slice(&content);
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

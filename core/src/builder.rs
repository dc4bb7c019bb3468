//! Turns an `ApiRequest` into a concrete `HttpRequest` descriptor.
//!
//! # Design
//! The builder is pure: it only concatenates host, base path, request path
//! and payload. GET requests carry their parameters in the query string;
//! every other verb carries the payload as the request body. Nothing here
//! touches the network or the token.

use crate::config::DEFAULT_PROTOCOL;
use crate::http::{HttpMethod, HttpRequest, Payload};

/// A request relative to the API's base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    /// Defaults to `https`.
    pub protocol: Option<String>,
    /// Defaults to `/`.
    pub path: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Payload,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Payload>) -> Self {
        self.body = body.into();
        self
    }
}

/// Resolves `ApiRequest`s against a fixed host and base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    host: String,
    endpoint: String,
}

impl RequestBuilder {
    pub fn new(host: &str, endpoint: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn build(&self, method: HttpMethod, req: &ApiRequest) -> HttpRequest {
        let mut path = format!("{}{}", self.endpoint, req.path.as_deref().unwrap_or("/"));

        let body = match (method, &req.body) {
            (_, Payload::Empty) => Vec::new(),
            (HttpMethod::Get, Payload::Params(params)) => {
                if !params.is_empty() {
                    path.push('?');
                    path.push_str(&params.encode());
                }
                Vec::new()
            }
            // Already encoded by the caller.
            (HttpMethod::Get, Payload::Raw(query)) => {
                if !query.is_empty() {
                    path.push('?');
                    path.push_str(&String::from_utf8_lossy(query));
                }
                Vec::new()
            }
            (_, Payload::Params(params)) => params.encode().into_bytes(),
            (_, Payload::Raw(bytes)) => bytes.clone(),
        };

        HttpRequest {
            method,
            protocol: req
                .protocol
                .clone()
                .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
            host: self.host.clone(),
            path,
            headers: req.headers.clone(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Params;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("api.example.com", "")
    }

    #[test]
    fn get_encodes_params_as_query_string() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        let req = builder().build(HttpMethod::Get, &ApiRequest::new("/v1/path").body(params));
        assert_eq!(req.url(), "https://api.example.com/v1/path?a=1&b=2");
        assert!(req.body.is_empty());
    }

    #[test]
    fn get_without_body_has_no_query() {
        let req = builder().build(HttpMethod::Get, &ApiRequest::new("/v1/portfolio"));
        assert_eq!(req.path, "/v1/portfolio");

        let req = builder().build(
            HttpMethod::Get,
            &ApiRequest::new("/v1/portfolio").body(Params::new()),
        );
        assert_eq!(req.path, "/v1/portfolio");
    }

    #[test]
    fn get_percent_encodes_values() {
        let params: Params = [("advertiserIds", "1,2"), ("q", "a b")].into_iter().collect();
        let req = builder().build(HttpMethod::Get, &ApiRequest::new("/v1/x").body(params));
        assert_eq!(req.path, "/v1/x?advertiserIds=1%2C2&q=a+b");
    }

    #[test]
    fn other_verbs_pass_raw_body_through() {
        let json = br#"{"name":"a&b"}"#.to_vec();
        for method in [
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
        ] {
            let req = builder().build(
                method,
                &ApiRequest::new("/v1/audiences").body(Payload::Raw(json.clone())),
            );
            assert_eq!(req.path, "/v1/audiences", "{method}");
            assert_eq!(req.body, json, "{method}");
        }
    }

    #[test]
    fn post_params_are_form_encoded() {
        let params: Params = [("client_id", "A"), ("grant_type", "client_credentials")]
            .into_iter()
            .collect();
        let req = builder().build(HttpMethod::Post, &ApiRequest::new("/oauth2/token").body(params));
        assert_eq!(req.body, b"client_id=A&grant_type=client_credentials");
        assert_eq!(req.path, "/oauth2/token");
    }

    #[test]
    fn defaults_path_and_protocol() {
        let req = RequestBuilder::new("api.example.com", "/base").build(HttpMethod::Get, &ApiRequest::default());
        assert_eq!(req.url(), "https://api.example.com/base/");
    }

    #[test]
    fn base_path_is_prefixed_and_protocol_overridable() {
        let req = RequestBuilder::new("localhost:3000/", "/marketing/")
            .build(HttpMethod::Get, &ApiRequest::new("/v1/portfolio").protocol("http"));
        assert_eq!(req.url(), "http://localhost:3000/marketing/v1/portfolio");
    }

    #[test]
    fn headers_keep_caller_order() {
        let api = ApiRequest::new("/v1/x")
            .header("Authorization", "Bearer t")
            .header("Accept", "application/json")
            .header("Accept", "text/csv");
        let req = builder().build(HttpMethod::Get, &api);
        let names: Vec<&str> = req.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["Authorization", "Accept", "Accept"]);
    }

    #[test]
    fn identical_inputs_build_identical_descriptors() {
        let params: Params = [("a", "1")].into_iter().collect();
        let api = ApiRequest::new("/v1/x").header("Accept", "application/json").body(params);
        let first = builder().build(HttpMethod::Get, &api);
        let second = builder().build(HttpMethod::Get, &api);
        assert_eq!(first, second);
        assert_eq!(first.url(), second.url());
    }
}

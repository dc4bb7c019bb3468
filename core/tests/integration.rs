//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client over real
//! HTTP with the default ureq transport. The server keeps a handle to its
//! token store so tests can revoke tokens mid-run and watch the client
//! recover.

use std::net::SocketAddr;

use mapi_core::{
    AudienceDetails, AudienceUsers, BudgetQuery, CampaignQuery, CampaignStatus, ClientConfig,
    Credentials, IdentifierSchema, MapiClient, MapiError, StatsOutput, StatsQuery,
};
use mock_server::MockState;

fn start_server(state: MockState) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr, secret: &str) -> MapiClient {
    MapiClient::with_config(
        Credentials::new("A", secret),
        ClientConfig::default()
            .protocol("http")
            .host(addr.to_string()),
    )
}

fn stats_query(format: &str) -> StatsQuery {
    StatsQuery {
        report_type: None,
        ignore_x_device: Some(false),
        advertiser_ids: "42".to_string(),
        start_date: "2024-01-01".to_string(),
        end_date: "2024-01-31".to_string(),
        dimensions: vec!["Day".to_string()],
        metrics: vec!["Clicks".to_string(), "Displays".to_string()],
        format: format.to_string(),
        currency: Some("EUR".to_string()),
        timezone: None,
    }
}

#[test]
fn resource_calls_end_to_end() {
    let state = MockState::new("A", "B");
    let addr = start_server(state.clone());
    let client = client_for(addr, "B");

    // Step 1: first call authenticates lazily.
    let campaign = client.get_campaign(123).unwrap();
    assert_eq!(campaign["method"], "GET");
    assert_eq!(campaign["path"], "/v1/campaigns/123");
    assert_eq!(state.tokens_issued(), 1);

    // Step 2: query filters arrive in order, unset ones omitted.
    let query = CampaignQuery {
        advertiser_ids: Some("1,2".to_string()),
        campaign_status: Some(CampaignStatus::Running),
        ..CampaignQuery::default()
    };
    let echo = client.get_campaigns(&query).unwrap();
    assert_eq!(
        echo["query"],
        serde_json::json!([["advertiserIds", "1,2"], ["campaignStatus", "Running"]])
    );

    let echo = client.get_budgets(&BudgetQuery::default()).unwrap();
    assert_eq!(echo["query"], serde_json::json!([["onlyActiveCampaigns", "true"]]));

    // Step 3: JSON bodies for write endpoints.
    let details = AudienceDetails {
        name: "Buyers".to_string(),
        description: Some("Recent buyers".to_string()),
    };
    let echo = client.create_audience(42, &details).unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["path"], "/v1/audiences/userlist");
    assert_eq!(echo["body"]["advertiserId"], "42");
    assert_eq!(echo["body"]["description"], "Recent buyers");

    let users = AudienceUsers {
        schema: IdentifierSchema::Email,
        identifiers: vec!["a@example.com".to_string()],
    };
    let echo = client.add_to_audience(7, &users).unwrap();
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echo["body"]["operation"], "add");

    let raw = client.delete_audience(7).unwrap();
    let echo: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(echo["method"], "DELETE");
    assert_eq!(echo["path"], "/v1/audiences/7");

    // All of the above shared a single token.
    assert_eq!(state.tokens_issued(), 1);
    assert_eq!(state.unauthorized_count(), 0);
}

#[test]
fn revoked_token_is_refreshed_once() {
    let state = MockState::new("A", "B");
    let addr = start_server(state.clone());
    let client = client_for(addr, "B");

    client.get_portfolio().unwrap();
    let first = client.token().unwrap();

    state.revoke_tokens();
    let portfolio = client.get_portfolio().unwrap();

    assert_eq!(portfolio["path"], "/v1/portfolio");
    assert_eq!(state.tokens_issued(), 2);
    assert_eq!(state.unauthorized_count(), 1);
    assert_ne!(client.token().unwrap(), first);
}

#[test]
fn persistent_401_fails_after_one_retry() {
    let state = MockState::new("A", "B");
    let addr = start_server(state.clone());
    let client = client_for(addr, "B");

    let err = client.get("/v1/status/401", mapi_core::Payload::Empty).unwrap_err();

    assert!(matches!(err, MapiError::Pipeline(_)), "{err:?}");
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(state.tokens_issued(), 2);
}

#[test]
fn server_errors_surface_with_status() {
    let state = MockState::new("A", "B");
    let addr = start_server(state.clone());
    let client = client_for(addr, "B");

    let err = client.get("/v1/status/502", mapi_core::Payload::Empty).unwrap_err();

    assert_eq!(err.status_code(), Some(502));
    assert_eq!(state.tokens_issued(), 1);
}

#[test]
fn wrong_secret_is_an_authentication_error() {
    let state = MockState::new("A", "B");
    let addr = start_server(state.clone());
    let client = client_for(addr, "not-the-secret");

    let err = client.get_portfolio().unwrap_err();

    assert!(matches!(err, MapiError::Authentication(_)), "{err:?}");
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(state.tokens_issued(), 0);
    assert_eq!(state.unauthorized_count(), 0);
}

#[test]
fn reports_in_every_mode() {
    let state = MockState::new("A", "B");
    let addr = start_server(state);
    let client = client_for(addr, "B");

    // JSON: BOM stripped and decoded, dates normalized before sending.
    match client.get_stats(&stats_query("Json"), None).unwrap() {
        StatsOutput::Json(rows) => {
            assert_eq!(rows[0]["Day"], "2024-01-01T00:00:00+00:00");
            assert_eq!(rows[0]["Clicks"], 3);
        }
        other => panic!("expected JSON, got {other:?}"),
    }

    // CSV: BOM stripped, bytes otherwise untouched.
    match client.get_seller_stats(&stats_query("CSV"), None).unwrap() {
        StatsOutput::Raw(bytes) => {
            assert_eq!(bytes, b"Day;Clicks;Displays\n2024-01-01T00:00:00+00:00;3;120\n");
        }
        other => panic!("expected raw bytes, got {other:?}"),
    }

    // File: written without the BOM.
    let path = std::env::temp_dir().join(format!("mapi-stats-{}.csv", uuid::Uuid::new_v4()));
    let output = client.get_stats(&stats_query("CSV"), Some(&path)).unwrap();
    assert!(output.is_saved());
    let saved = std::fs::read(&path).unwrap();
    assert!(saved.starts_with(b"Day;Clicks;Displays\n"));
    std::fs::remove_file(&path).unwrap();

    // Unwritable destination.
    let bad = std::env::temp_dir()
        .join(format!("mapi-no-dir-{}", uuid::Uuid::new_v4()))
        .join("stats.csv");
    let err = client.get_stats(&stats_query("CSV"), Some(&bad)).unwrap_err();
    assert!(matches!(err, MapiError::Io { .. }), "{err:?}");
}

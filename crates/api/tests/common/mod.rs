#![allow(dead_code)]

use api::{build_app, AppState};
use axum_test::TestServer;
use httpmock::prelude::*;
use serde_json::json;

/// Helper function to create a test configuration pointing at a stubbed
/// provider
pub fn test_auth_config(provider: &MockServer) -> config::AuthConfig {
    config::AuthConfig {
        provider: config::ProviderConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_url: "http://localhost:3000/callback".to_string(),
            auth_url: provider.url("/authorize"),
            token_url: provider.url("/token"),
            userinfo_url: provider.url("/userinfo"),
            scopes: vec!["profile".to_string(), "email".to_string()],
        },
        session_ttl_hours: 24,
        pending_ttl_minutes: 10,
        http_timeout_secs: 5,
    }
}

/// Setup a complete test server backed by the stubbed provider
pub fn setup_test_server(provider: &MockServer) -> TestServer {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .try_init();

    let state = AppState::from_config(&test_auth_config(provider)).unwrap();
    TestServer::new(build_app(state)).unwrap()
}

/// Stub a provider that accepts any code and returns Ann's profile
pub fn mock_happy_provider(provider: &MockServer) {
    provider.mock(|when, then| {
        when.method(POST).path("/token");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access_token": "AT1", "token_type": "Bearer"}));
    });
    provider.mock(|when, then| {
        when.method(GET)
            .path("/userinfo")
            .header("authorization", "Bearer AT1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"sub": "u1", "name": "Ann", "emails": ["ann@x.com"]}));
    });
}

/// Pull the state token out of the authorization URL the /login redirect
/// points at
pub fn state_from_location(location: &str) -> String {
    let url = url::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.to_string())
        .expect("authorization URL carries no state parameter")
}

/// Pull the session token out of a Set-Cookie header value
pub fn session_token_from_set_cookie(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("session="))
        .expect("Set-Cookie does not carry a session token")
        .to_string()
}

//! Tests for the auth module

use super::*;
use crate::error::Error;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refresh_config(server: &MockServer) -> AuthConfig {
    AuthConfig::Refresh(RefreshGrant {
        token_url: format!("{}/oauth/v2/token", server.uri()),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "my-refresh-token".to_string(),
    })
}

#[tokio::test]
async fn test_static_token() {
    let auth = Authenticator::new(AuthConfig::Static {
        token: "1000.static".to_string(),
    });
    assert!(!auth.can_refresh());

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://example.com/api")).await.unwrap();

    let built = req.build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Zoho-oauthtoken 1000.static"
    );
}

#[tokio::test]
async fn test_refresh_grant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed-token",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));

    let client = reqwest::Client::new();
    let req = auth.apply(client.get("https://example.com/api")).await.unwrap();

    let built = req.build().unwrap();
    assert_eq!(
        built.headers().get("Authorization").unwrap(),
        "Zoho-oauthtoken refreshed-token"
    );
}

#[tokio::test]
async fn test_refreshed_token_is_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "cached-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    assert!(auth.can_refresh());

    for _ in 0..3 {
        assert_eq!(auth.access_token().await.unwrap(), "cached-token");
    }
}

#[tokio::test]
async fn test_invalidate_forces_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));

    auth.access_token().await.unwrap();
    auth.invalidate().await;
    auth.access_token().await.unwrap();
}

#[tokio::test]
async fn test_refresh_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    let err = auth.access_token().await.unwrap_err();

    assert!(matches!(err, Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_refresh_error_in_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "invalid_code"
        })))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(refresh_config(&mock_server));
    let err = auth.access_token().await.unwrap_err();

    assert!(err.to_string().contains("invalid_code"));
}

#[test]
fn test_auth_config_from_tap_config() {
    let config = crate::config::TapConfig::from_value(serde_json::json!({
        "client_id": "id",
        "client_secret": "secret",
        "refresh_token": "refresh",
        "start_date": "2019-01-01T00:00:00Z",
        "api_version": "v8",
        "select_fields_by_default": true,
        "accounts_server": "https://accounts.zoho.eu"
    }))
    .unwrap();

    match AuthConfig::from_tap_config(&config) {
        AuthConfig::Refresh(grant) => {
            assert_eq!(grant.token_url, "https://accounts.zoho.eu/oauth/v2/token");
        }
        other => panic!("unexpected auth config: {other:?}"),
    }
}

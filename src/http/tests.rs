//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::config::{ConnectionConfig, HttpSettings};
use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;
use wiremock::matchers::{header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(base_url: String) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(base_url)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.max_retries, 2);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_none());
    assert!(config.verify_ssl);
    assert_eq!(
        config.default_headers.get("Accept-Encoding"),
        Some(&"gzip, deflate".to_string())
    );
}

#[test]
fn test_http_client_config_from_settings() {
    let mut conn = ConnectionConfig::new("https://sap.local", "u", "p");
    conn.verify_ssl = false;
    let http = HttpSettings {
        max_retries: 5,
        timeout_secs: 10,
        requests_per_second: Some(4),
        run_timeout_secs: None,
    };

    let config = HttpClientConfig::from_settings(&conn, &http);
    assert_eq!(config.base_url.as_deref(), Some("https://sap.local"));
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.max_retries, 5);
    assert!(!config.verify_ssl);
    assert_eq!(config.rate_limit.map(|r| r.requests_per_second), Some(4));
}

#[test]
fn test_request_config_keeps_query_order() {
    let config = RequestConfig::new()
        .query("limit", "10")
        .query("offset", "20");

    assert_eq!(
        config.query,
        vec![
            ("limit".to_string(), "10".to_string()),
            ("offset".to_string(), "20".to_string())
        ]
    );
    assert_eq!(config.query_value("offset"), Some("20"));
    assert_eq!(config.query_value("page"), None);
}

#[tokio::test]
async fn test_get_json_sends_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES/ZMAT"))
        .and(query_param("limit", "100"))
        .and(headers("Accept-Encoding", vec!["gzip", "deflate"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": 42
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let data: serde_json::Value = client
        .get_json("DATA_SOURCES/ZMAT", RequestConfig::new().query("limit", "100"))
        .await
        .unwrap();

    assert_eq!(data["value"], 42);
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client
        .get_json::<serde_json::Value>("DATA_SOURCES", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { ref endpoint, .. } if endpoint == "DATA_SOURCES"));
}

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let body: serde_json::Value = client.get_json("/flaky", RequestConfig::new()).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_retry_when_body_transfer_fails() {
    let mock_server = MockServer::start().await;

    // Declares gzip but the body is not a gzip stream, so reading it fails
    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES/ZMAT"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(b"truncated".to_vec()),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES/ZMAT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"rows": 2})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let body: serde_json::Value = client
        .get_json("DATA_SOURCES/ZMAT", RequestConfig::new())
        .await
        .unwrap();
    assert_eq!(body["rows"], 2);
}

#[tokio::test]
async fn test_body_failure_without_retries_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES/ZMAT"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(b"truncated".to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(0)
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let err = client
        .get_json::<serde_json::Value>("DATA_SOURCES/ZMAT", RequestConfig::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_retries_exhausted_returns_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client.get_json::<serde_json::Value>("/down", RequestConfig::new()).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert!(err.is_retryable());
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such data source"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client.get_json::<serde_json::Value>("/missing", RequestConfig::new()).await.unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such data source");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client.get_json::<serde_json::Value>("DATA_SOURCES", RequestConfig::new()).await.unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_basic_auth_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/DATA_SOURCES"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_auth(
        fast_config(mock_server.uri()),
        AuthConfig::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        },
    )
    .unwrap();

    let body: serde_json::Value = client.get_json("DATA_SOURCES", RequestConfig::new()).await.unwrap();
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn test_rate_limited_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(1)
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let err = client.get_json::<serde_json::Value>("/busy", RequestConfig::new()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 0
        }
    ));
}

#[test]
fn test_calculate_backoff() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(100),
                Duration::from_millis(500),
            )
            .build(),
    )
    .unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));

    let linear = HttpClient::with_config(
        HttpClientConfig::builder()
            .backoff(
                BackoffType::Linear,
                Duration::from_millis(100),
                Duration::from_secs(10),
            )
            .build(),
    )
    .unwrap();
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_rate_limiter_enabled_from_config() {
    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .rate_limit(RateLimiterConfig::per_second(2))
            .build(),
    )
    .unwrap();
    assert!(client.has_rate_limiter());
}

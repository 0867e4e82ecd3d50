//! HTTP server mode for the configuration UI
//!
//! Exposes the configuration-time actions: listing resources and testing the
//! connection. Request bodies are configuration documents, either
//! `{"action": ..., "parameters": {...}}` or a bare parameters object.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::runner::{check_connection, list_select_elements, spec_document};
use crate::config::ConfigFile;
use crate::error::{Error, Result, ResultExt};

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the API router
pub fn router() -> Router {
    // Build CORS layer - allow all origins for the configuration UI
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/spec", get(spec))
        .route("/resources", post(list_resources))
        .route("/check", post(check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server; returns when `shutdown` is cancelled
pub async fn serve(port: u16, shutdown: CancellationToken) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Configuration schemas
async fn spec() -> impl IntoResponse {
    Json(spec_document())
}

/// List extractable resources
async fn list_resources(Json(body): Json<Value>) -> Response {
    let config = match ConfigFile::from_value(body) {
        Ok(file) => file.parameters,
        Err(e) => return error_response(&e),
    };

    match list_select_elements(&config).await {
        Ok(elements) => (StatusCode::OK, Json(ApiResponse::success(elements))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Check connection to the SAP endpoint
async fn check(Json(body): Json<Value>) -> Response {
    let config = match ConfigFile::from_value(body) {
        Ok(file) => file.parameters,
        Err(e) => return error_response(&e),
    };

    match check_connection(&config).await {
        Ok(count) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({
                "status": "SUCCEEDED",
                "data_sources": count
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &Error) -> Response {
    let status = match e {
        Error::Auth { .. } | Error::TokenRequest { .. } => StatusCode::UNAUTHORIZED,
        e if e.is_user_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn parameters(server_url: &str) -> Value {
        json!({
            "action": "listResources",
            "parameters": {
                "authentication": {
                    "server_url": server_url,
                    "username": "extractor",
                    "#password": "secret"
                },
                "http": {"max_retries": 0}
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_spec_lists_both_schemas() {
        let request = Request::builder().uri("/spec").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "SPEC");
        assert!(body["spec"]["authentication"]["properties"]["#password"].is_object());
        assert!(body["spec"]["row"]["properties"]["source"].is_object());
    }

    #[tokio::test]
    async fn test_resources_returns_select_elements() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/DATA_SOURCES"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "DATA_SOURCES": [
                    {"SOURCE_ALIAS": "ZMAT", "SOURCE_TEXT": "Materials", "PAGING": true},
                    {"SOURCE_ALIAS": "ZRAW", "SOURCE_TEXT": "", "PAGING": false}
                ]
            })))
            .mount(&server)
            .await;

        let (status, body) = send(post_json("/resources", &parameters(&server.uri()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([
                {"label": "Materials (ZMAT)", "value": "ZMAT"},
                {"label": "ZRAW", "value": "ZRAW"}
            ])
        );
    }

    #[tokio::test]
    async fn test_check_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/DATA_SOURCES"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (status, body) = send(post_json("/check", &parameters(&server.uri()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_check_missing_server_url_is_bad_request() {
        let body = json!({"parameters": {"authentication": {"username": "u"}}});
        let (status, body) = send(post_json("/check", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("server_url"));
    }
}

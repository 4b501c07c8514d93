//! End-to-end tests for the proxy backend.
//!
//! Each test runs a real upstream on an ephemeral port: either a local-backend
//! instance of this service or a scripted stand-in for failure cases.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing};
use common::*;
use feature_server::{AppState, ProxyBackend, router};
use serde_json::json;

fn proxy_app(upstream: &str, timeout: Duration) -> Router {
    let backend = ProxyBackend::new(upstream, timeout).unwrap();
    router(AppState::new(Arc::new(backend)))
}

async fn proxy_to_local() -> Router {
    let addr = serve(local_app(sample_data())).await;
    proxy_app(&format!("http://{}", addr), Duration::from_secs(5))
}

/// An upstream answering every endpoint with the given status and body.
async fn scripted_upstream(status: StatusCode, body: serde_json::Value) -> String {
    let reply = move || {
        let body = body.clone();
        async move { (status, Json(body)) }
    };
    let app = Router::new()
        .route("/get_data", routing::get(reply.clone()))
        .route("/get_top_effects", routing::get(reply.clone()))
        .route("/get_description", routing::post(reply.clone()))
        .route("/search/{term}", routing::get(reply));
    format!("http://{}", serve(app).await)
}

fn unused_port_url() -> String {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    format!("http://{}", addr)
}

#[tokio::test]
async fn relays_similarity_rows() {
    let response = send(proxy_to_local().await, get("/get_data?index=3")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::to_value(similarity_row(3)).unwrap());
    assert_cors(&response.headers);
}

#[tokio::test]
async fn relays_top_effects() {
    let response = send(proxy_to_local().await, get("/get_top_effects?feature=0")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::to_value(effects_row(0)).unwrap());
}

#[tokio::test]
async fn relays_descriptions() {
    let response = send(
        proxy_to_local().await,
        post_json("/get_description", r#"{"keys": [3, 5, 7]}"#),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"descriptions": {"3": "cat feature", "7": "dog feature"}})
    );
    assert_cors(&response.headers);
}

#[tokio::test]
async fn relays_search_with_encoded_term() {
    let response = send(proxy_to_local().await, get("/search/CAT%20detector")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([["Cat Detector", 3, 0.91]]));
}

#[tokio::test]
async fn validates_before_forwarding() {
    let app = proxy_app(&unused_port_url(), Duration::from_secs(1));

    let response = send(app.clone(), get("/get_data")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, error_body("Missing parameters"));

    let response = send(app, post_json("/get_description", r#"{"nope": 1}"#)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_cors(&response.headers);
}

#[tokio::test]
async fn upstream_rejection_becomes_upstream_failure() {
    // The upstream answers 400 for an out-of-range feature
    let response = send(proxy_to_local().await, get("/get_top_effects?feature=50")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, error_body("Failed to fetch data from external API"));
    assert_cors(&response.headers);
}

#[tokio::test]
async fn unreachable_upstream() {
    let app = proxy_app(&unused_port_url(), Duration::from_secs(2));

    for uri in ["/get_data?index=0", "/get_top_effects?feature=0", "/search/cat"] {
        let response = send(app.clone(), get(uri)).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(response.body, error_body("Failed to fetch data from external API"));
        assert_cors(&response.headers);
    }

    let response = send(app, post_json("/get_description", r#"{"keys": [1]}"#)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "An unexpected error occurred");
    assert!(response.body["details"].is_string());
}

#[tokio::test]
async fn legacy_error_body_with_200_is_upstream_failure() {
    let upstream = scripted_upstream(StatusCode::OK, json!({"error": "Feature out of range"})).await;
    let app = proxy_app(&upstream, Duration::from_secs(5));

    let response = send(app, get("/get_top_effects?feature=99999")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, error_body("Failed to fetch data from external API"));
}

#[tokio::test]
async fn description_client_errors_pass_through() {
    let rejection = json!({"error": "Invalid request. Expected a JSON object with a 'keys' list."});
    let upstream = scripted_upstream(StatusCode::BAD_REQUEST, rejection.clone()).await;
    let app = proxy_app(&upstream, Duration::from_secs(5));

    let response = send(app, post_json("/get_description", r#"{"keys": [1]}"#)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, rejection);
    assert_cors(&response.headers);
}

#[tokio::test]
async fn description_server_errors_report_status() {
    let upstream = scripted_upstream(StatusCode::BAD_GATEWAY, json!({"error": "down"})).await;
    let app = proxy_app(&upstream, Duration::from_secs(5));

    let response = send(app.clone(), post_json("/get_description", r#"{"keys": [1]}"#)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, error_body("External API returned status 502"));

    // Other endpoints collapse every upstream failure into one message
    let response = send(app, get("/search/cat")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, error_body("Failed to fetch data from external API"));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let app = Router::new().route(
        "/get_data",
        routing::get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"indices": [], "values": []}))
        }),
    );
    let upstream = format!("http://{}", serve(app).await);
    let proxy = proxy_app(&upstream, Duration::from_millis(200));

    let response = send(proxy, get("/get_data?index=0")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, error_body("Failed to fetch data from external API"));
}

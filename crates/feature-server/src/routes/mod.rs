//! HTTP routes
//!
//! Every route answers `OPTIONS` with an empty 200, and every response
//! (including errors, 404s and 405s) carries the CORS headers below.

pub mod description;
pub mod effects;
pub mod search;
pub mod similarity;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::AppState;
use crate::error::{ErrorBody, METHOD_NOT_ALLOWED, NOT_FOUND};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type,Authorization";
pub const ALLOW_METHODS: &str = "GET,PUT,POST,DELETE,OPTIONS";

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello).options(preflight))
        .route("/get_data", get(similarity::handler).options(preflight))
        .route("/get_cos_sim", get(similarity::handler).options(preflight))
        .route("/get_top_effects", get(effects::handler).options(preflight))
        .route(
            "/get_description",
            post(description::handler).options(preflight),
        )
        .route("/search", get(search::missing_term).options(preflight))
        .route("/search/", get(search::missing_term).options(preflight))
        .route("/search/{term}", get(search::handler).options(preflight))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN))
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS))
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Handler for `OPTIONS` on every route
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /`
async fn hello() -> impl IntoResponse {
    Json(json!({ "message": "Hello, World!" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(NOT_FOUND)))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new(METHOD_NOT_ALLOWED)),
    )
}

/// Read an integer query parameter. Absent or unparseable values are `None`.
fn int_param(params: &HashMap<String, String>, name: &str) -> Option<i64> {
    params.get(name)?.trim().parse().ok()
}

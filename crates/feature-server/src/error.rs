//! Errors surfaced to HTTP clients.
//!
//! Every variant renders as a JSON `{error}` body (plus `details` for
//! unexpected failures). Upstream rejections are relayed as-is.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const MISSING_INDEX: &str = "Missing parameters";
pub const MISSING_FEATURE: &str = "Missing feature parameter";
pub const INDEX_OUT_OF_RANGE: &str = "Index out of range";
pub const FEATURE_OUT_OF_RANGE: &str = "Feature out of range";
pub const INVALID_DESCRIPTION_REQUEST: &str =
    "Invalid request. Expected a JSON object with a 'keys' list.";
pub const MISSING_SEARCH_TERM: &str = "No search term provided";
pub const INVALID_SEARCH_TERM: &str = "Invalid search term";
pub const NOT_FOUND: &str = "Not found";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const UPSTREAM_FAILURE: &str = "Failed to fetch data from external API";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// JSON error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(&'static str),

    /// Index or feature outside the loaded table, with the value requested
    #[error("{0}")]
    OutOfRange(&'static str, i64),

    /// Upstream unreachable, timed out, or answered with something other than 200
    #[error("Failed to fetch data from external API")]
    Upstream,

    /// Upstream answered the description endpoint with a non-200, non-4xx status
    #[error("External API returned status {0}")]
    UpstreamStatus(u16),

    /// Upstream rejected the request; its status and body are passed through
    #[error("Upstream rejected the request with status {0}")]
    Relayed(StatusCode, Value),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::OutOfRange(..) => StatusCode::BAD_REQUEST,
            ApiError::Relayed(status, _) => *status,
            ApiError::Upstream | ApiError::UpstreamStatus(_) | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Log line for this error. Includes the offending input where there is one.
    pub fn log_message(&self) -> String {
        match self {
            ApiError::OutOfRange(message, value) => format!("{} (requested {})", message, value),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.log_message());
        } else {
            tracing::warn!("Request rejected: {}", self.log_message());
        }

        match self {
            ApiError::Relayed(status, body) => (status, Json(body)).into_response(),
            ApiError::Unexpected(details) => (
                status,
                Json(ErrorBody {
                    error: UNEXPECTED_ERROR.to_string(),
                    details: Some(details),
                }),
            )
                .into_response(),
            other => (status, Json(ErrorBody::new(other.to_string()))).into_response(),
        }
    }
}

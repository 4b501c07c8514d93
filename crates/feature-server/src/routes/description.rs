//! Autointerp descriptions: `POST /get_description` with `{"keys": [...]}`
//!
//! Keys may be any JSON value; numbers and strings are matched against the
//! description table. Keys without a description are left out of the
//! response rather than reported as errors.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use feature_data::{DescriptionRequest, DescriptionResponse};

use crate::AppState;
use crate::error::{ApiError, INVALID_DESCRIPTION_REQUEST};

/// Parse the raw body so malformed JSON gets our error payload, not axum's rejection.
fn parse_request(body: &[u8]) -> Result<DescriptionRequest, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(
            "Invalid description request ({}): {}",
            e,
            String::from_utf8_lossy(body)
        );
        ApiError::Validation(INVALID_DESCRIPTION_REQUEST)
    })
}

/// Handler for `POST /get_description`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<DescriptionResponse>, ApiError> {
    let request = parse_request(&body)?;
    tracing::info!("Description lookup for {} keys", request.keys.len());
    tracing::debug!("Requested keys: {:?}", request.keys);

    let response = state.backend.descriptions(&request).await?;
    tracing::debug!("Found {} descriptions", response.descriptions.len());
    Ok(Json(response))
}

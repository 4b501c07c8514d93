//! Name search: `GET /search/{term}`

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use feature_data::FeatureRecord;

use crate::AppState;
use crate::error::{ApiError, INVALID_SEARCH_TERM, MISSING_SEARCH_TERM};

/// Handler for `GET /search/{term}`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    term: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<FeatureRecord>>, ApiError> {
    let Path(term) = term.map_err(|rejection| {
        tracing::warn!("Unreadable search term: {}", rejection);
        ApiError::Validation(INVALID_SEARCH_TERM)
    })?;
    if term.is_empty() {
        return Err(ApiError::Validation(MISSING_SEARCH_TERM));
    }

    let results = state.backend.search(&term).await?;
    tracing::info!("Search for {:?} matched {} records", term, results.len());
    Ok(Json(results))
}

/// Handler for `GET /search` and `GET /search/`
pub async fn missing_term() -> ApiError {
    ApiError::Validation(MISSING_SEARCH_TERM)
}

//! Cosine similarity neighbours: `GET /get_data?index=N` (alias `/get_cos_sim`)

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use feature_data::FeatureRow;

use super::int_param;
use crate::AppState;
use crate::error::{ApiError, MISSING_INDEX};

/// Handler for `GET /get_data`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<FeatureRow>, ApiError> {
    tracing::debug!("get_data params: {:?}", params);

    let index = int_param(&params, "index").ok_or(ApiError::Validation(MISSING_INDEX))?;
    tracing::info!("Similarity lookup for index {} via {}", index, state.backend.name());

    let row = state.backend.similarity(index).await?;
    Ok(Json(row))
}

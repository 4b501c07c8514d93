//! Top effects: `GET /get_top_effects?feature=N`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use feature_data::FeatureRow;

use super::int_param;
use crate::AppState;
use crate::error::{ApiError, MISSING_FEATURE};

/// Handler for `GET /get_top_effects`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<FeatureRow>, ApiError> {
    let feature = int_param(&params, "feature").ok_or_else(|| {
        tracing::debug!("get_top_effects without a usable feature: {:?}", params);
        ApiError::Validation(MISSING_FEATURE)
    })?;
    tracing::info!("Top effects lookup for feature {}", feature);

    Ok(Json(state.backend.top_effects(feature).await?))
}

use std::sync::Arc;

use async_trait::async_trait;
use feature_data::{DescriptionRequest, DescriptionResponse, FeatureData, FeatureRecord, FeatureRow};

use super::FeatureBackend;
use crate::error::{ApiError, FEATURE_OUT_OF_RANGE, INDEX_OUT_OF_RANGE};

/// Serves lookups from tables held in memory.
pub struct LocalBackend {
    data: Arc<FeatureData>,
}

impl LocalBackend {
    pub fn new(data: Arc<FeatureData>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl FeatureBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn similarity(&self, index: i64) -> Result<FeatureRow, ApiError> {
        self.data.get_similarity(index).cloned().map_err(|e| {
            tracing::debug!("{}", e);
            ApiError::OutOfRange(INDEX_OUT_OF_RANGE, index)
        })
    }

    async fn top_effects(&self, feature: i64) -> Result<FeatureRow, ApiError> {
        self.data.get_top_effects(feature).cloned().map_err(|e| {
            tracing::debug!("{} (offset {})", e, self.data.effects_offset());
            ApiError::OutOfRange(FEATURE_OUT_OF_RANGE, feature)
        })
    }

    async fn descriptions(
        &self,
        request: &DescriptionRequest,
    ) -> Result<DescriptionResponse, ApiError> {
        Ok(self.data.get_descriptions(&request.keys))
    }

    async fn search(&self, term: &str) -> Result<Vec<FeatureRecord>, ApiError> {
        Ok(self.data.search(term))
    }
}

//! Where lookups are answered.
//!
//! Implementations:
//! - `LocalBackend` - In-memory tables loaded at startup
//! - `ProxyBackend` - Forwards to another deployed instance of this service

mod local;
mod proxy;

use async_trait::async_trait;
use feature_data::{DescriptionRequest, DescriptionResponse, FeatureRecord, FeatureRow};

use crate::error::ApiError;

pub use local::LocalBackend;
pub use proxy::ProxyBackend;

/// The four lookups exposed over HTTP.
///
/// Input has already been validated by the route; errors come back ready to
/// render.
#[async_trait]
pub trait FeatureBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Cosine similarity neighbours of `index`.
    async fn similarity(&self, index: i64) -> Result<FeatureRow, ApiError>;

    /// Most affected indices for `feature`.
    async fn top_effects(&self, feature: i64) -> Result<FeatureRow, ApiError>;

    /// Descriptions for the requested keys; unknown keys are omitted.
    async fn descriptions(
        &self,
        request: &DescriptionRequest,
    ) -> Result<DescriptionResponse, ApiError>;

    /// Records whose name contains `term`, ignoring case.
    async fn search(&self, term: &str) -> Result<Vec<FeatureRecord>, ApiError>;
}

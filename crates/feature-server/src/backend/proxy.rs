use std::time::Duration;

use async_trait::async_trait;
use feature_data::{DescriptionRequest, DescriptionResponse, FeatureRecord, FeatureRow};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::FeatureBackend;
use crate::error::ApiError;

/// Forwards lookups to another instance of this service and relays its JSON.
///
/// Upstream CORS headers are dropped; the router adds its own.
pub struct ProxyBackend {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send `request`, accepting only a 200 with a decodable body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Upstream request failed: {}", e);
            ApiError::Upstream
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Upstream {} returned status {}", response.url(), status);
            return Err(ApiError::Upstream);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::warn!("Upstream returned an unreadable body: {}", e);
            ApiError::Upstream
        })
    }
}

#[async_trait]
impl FeatureBackend for ProxyBackend {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn similarity(&self, index: i64) -> Result<FeatureRow, ApiError> {
        let request = self
            .client
            .get(self.url("get_data"))
            .query(&[("index", index)]);
        self.fetch(request).await
    }

    async fn top_effects(&self, feature: i64) -> Result<FeatureRow, ApiError> {
        let request = self
            .client
            .get(self.url("get_top_effects"))
            .query(&[("feature", feature)]);
        self.fetch(request).await
    }

    async fn descriptions(
        &self,
        request: &DescriptionRequest,
    ) -> Result<DescriptionResponse, ApiError> {
        let url = self.url("get_description");
        tracing::debug!("Sending description request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::OK {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Unexpected(e.to_string()));
        }

        if status.is_client_error() {
            // Pass the upstream's own validation error through untouched
            let body = response.json::<Value>().await.unwrap_or_else(|_| {
                json!({ "error": format!("External API returned status {}", status.as_u16()) })
            });
            return Err(ApiError::Relayed(status, body));
        }

        Err(ApiError::UpstreamStatus(status.as_u16()))
    }

    async fn search(&self, term: &str) -> Result<Vec<FeatureRecord>, ApiError> {
        let url = self.url(&format!("search/{}", urlencoding::encode(term)));
        self.fetch(self.client.get(url)).await
    }
}

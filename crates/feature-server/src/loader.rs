//! Startup loading of the feature tables.

use feature_data::{
    DecodeError, FeatureData, decode_descriptions, decode_records, decode_table,
};
use thiserror::Error;

use crate::config::ResourceKeys;
use crate::store::{BlobStore, StoreError};

/// A resource that could not be loaded. Always names the failing key.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch resource '{key}': {source}")]
    Fetch { key: String, source: StoreError },

    #[error("Failed to decode resource '{key}': {source}")]
    Decode { key: String, source: DecodeError },
}

async fn fetch(store: &dyn BlobStore, key: &str) -> Result<Vec<u8>, LoadError> {
    tracing::debug!("Fetching {} from {}", key, store.location());
    store.fetch(key).await.map_err(|source| LoadError::Fetch {
        key: key.to_string(),
        source,
    })
}

fn decode_error(key: impl Into<String>) -> impl FnOnce(DecodeError) -> LoadError {
    let key = key.into();
    move |source| LoadError::Decode { key, source }
}

/// Fetch and decode every resource, building the dataset served by the local backend.
///
/// Nothing is returned unless every resource loaded; there is no partial state.
pub async fn load_dataset(
    store: &dyn BlobStore,
    keys: &ResourceKeys,
    effects_offset: i64,
) -> Result<FeatureData, LoadError> {
    tracing::info!("Loading feature data from {}", store.location());

    let (sim_indices, sim_values, top_indices, top_values, descriptions, records) = tokio::try_join!(
        fetch(store, &keys.cos_sim_indices),
        fetch(store, &keys.cos_sim_values),
        fetch(store, &keys.top_indices),
        fetch(store, &keys.top_values),
        fetch(store, &keys.descriptions),
        fetch(store, &keys.records),
    )?;

    let similarity = decode_table(&sim_indices, &sim_values).map_err(decode_error(format!(
        "{} + {}",
        keys.cos_sim_indices, keys.cos_sim_values
    )))?;
    let effects = decode_table(&top_indices, &top_values).map_err(decode_error(format!(
        "{} + {}",
        keys.top_indices, keys.top_values
    )))?;
    let descriptions =
        decode_descriptions(&descriptions).map_err(decode_error(&keys.descriptions))?;
    let records = decode_records(&records).map_err(decode_error(&keys.records))?;

    let data = FeatureData::new(similarity, effects, descriptions, records)
        .with_effects_offset(effects_offset);

    tracing::info!(
        "Loaded {} similarity rows, {} effects rows (offset {}), {} descriptions, {} records",
        data.similarity_len(),
        data.effects_len(),
        data.effects_offset(),
        data.description_count(),
        data.record_count()
    );

    Ok(data)
}

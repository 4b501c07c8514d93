//! Indexed lookups over the loaded tables.

use thiserror::Error;

use crate::records::{DescriptionMap, DescriptionResponse, FeatureKey, FeatureRecord, FeatureRecords};
use crate::table::{FeatureRow, RowTable};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{what} {value} out of range (table has {len} rows)")]
    OutOfRange {
        what: &'static str,
        value: i64,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, LookupError>;

/// Everything the service serves, loaded once at startup.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FeatureData {
    similarity: RowTable,
    effects: RowTable,
    /// Subtracted from a feature id before indexing `effects`
    effects_offset: i64,
    descriptions: DescriptionMap,
    records: FeatureRecords,
}

impl FeatureData {
    pub fn new(
        similarity: RowTable,
        effects: RowTable,
        descriptions: DescriptionMap,
        records: FeatureRecords,
    ) -> Self {
        Self {
            similarity,
            effects,
            effects_offset: 0,
            descriptions,
            records,
        }
    }

    /// Set the id of the first feature stored in the effects table.
    ///
    /// Effects tables cut from a slice of the feature space (e.g. features
    /// 8000..24000) are addressed with their global feature ids.
    pub fn with_effects_offset(mut self, offset: i64) -> Self {
        self.effects_offset = offset;
        self
    }

    pub fn effects_offset(&self) -> i64 {
        self.effects_offset
    }

    pub fn similarity_len(&self) -> usize {
        self.similarity.len()
    }

    pub fn effects_len(&self) -> usize {
        self.effects.len()
    }

    pub fn description_count(&self) -> usize {
        self.descriptions.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Nearest neighbours of `index` by cosine similarity.
    pub fn get_similarity(&self, index: i64) -> Result<&FeatureRow> {
        self.similarity.get(index).ok_or(LookupError::OutOfRange {
            what: "index",
            value: index,
            len: self.similarity.len(),
        })
    }

    /// Most affected indices for `feature`, after applying the effects offset.
    pub fn get_top_effects(&self, feature: i64) -> Result<&FeatureRow> {
        let out_of_range = LookupError::OutOfRange {
            what: "feature",
            value: feature,
            len: self.effects.len(),
        };

        let shifted = feature
            .checked_sub(self.effects_offset)
            .ok_or_else(|| out_of_range.clone())?;
        self.effects.get(shifted).ok_or(out_of_range)
    }

    pub fn get_descriptions(&self, keys: &[FeatureKey]) -> DescriptionResponse {
        self.descriptions.describe(keys)
    }

    pub fn search(&self, term: &str) -> Vec<FeatureRecord> {
        self.records.search(term)
    }
}

//! Row tables pairing neighbour indices with their scores.

use serde::{Deserialize, Serialize};

/// One row of a similarity or effects table.
///
/// `indices[i]` is paired with `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub indices: Vec<i64>,
    pub values: Vec<f32>,
}

/// Ordered rows addressed by a non-negative position.
///
/// Used for both the cosine similarity table and the top effects table.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    rows: Vec<FeatureRow>,
}

impl RowTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `position`, or `None` when negative or past the end.
    pub fn get(&self, position: i64) -> Option<&FeatureRow> {
        usize::try_from(position)
            .ok()
            .and_then(|i| self.rows.get(i))
    }
}

impl FromIterator<FeatureRow> for RowTable {
    fn from_iter<T: IntoIterator<Item = FeatureRow>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

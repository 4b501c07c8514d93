//! Autointerp descriptions and searchable feature records.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A feature id as sent by clients: a number, its string form, or any
/// other JSON value. Other values are looked up by their JSON text and
/// normally match nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureKey {
    Id(i64),
    Name(String),
    Other(Value),
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Id(id) => write!(f, "{}", id),
            FeatureKey::Name(name) => f.write_str(name),
            FeatureKey::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for FeatureKey {
    fn from(id: i64) -> Self {
        FeatureKey::Id(id)
    }
}

impl From<&str> for FeatureKey {
    fn from(name: &str) -> Self {
        FeatureKey::Name(name.to_string())
    }
}

/// Body of `POST /get_description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRequest {
    pub keys: Vec<FeatureKey>,
}

/// Descriptions found for the requested keys. Unknown keys are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionResponse {
    pub descriptions: BTreeMap<String, String>,
}

/// Stringified feature id -> human readable description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DescriptionMap {
    entries: HashMap<String, String>,
}

impl DescriptionMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Collect descriptions for `keys`, skipping any the map doesn't know.
    pub fn describe(&self, keys: &[FeatureKey]) -> DescriptionResponse {
        let descriptions = keys
            .iter()
            .map(ToString::to_string)
            .filter_map(|key| {
                let description = self.get(&key)?.to_string();
                Some((key, description))
            })
            .collect();

        DescriptionResponse { descriptions }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DescriptionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One `[name, ...]` record. Everything after the name is relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(pub Vec<Value>);

impl FeatureRecord {
    /// The searchable first field, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.0.first().and_then(Value::as_str)
    }
}

/// Ordered records searched by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecords {
    records: Vec<FeatureRecord>,
}

impl FeatureRecords {
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive substring search over record names.
    ///
    /// Results keep the stored order. An empty term matches nothing.
    pub fn search(&self, term: &str) -> Vec<FeatureRecord> {
        if term.is_empty() {
            return Vec::new();
        }

        let needle = term.to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                record
                    .name()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

//! Configuration loading and management

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No data source: set FEATURE_DATA_DIR or FEATURE_BUCKET_URL")]
    MissingDataSource,

    #[error("Both FEATURE_DATA_DIR and FEATURE_BUCKET_URL are set; pick one")]
    ConflictingDataSource,

    #[error("No {0} upstream URL configured for the proxy backend")]
    MissingUpstream(&'static str),
}

/// Where requests are answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Load the tables at startup and serve them from memory
    Local,
    /// Forward every request to another instance of this service
    Proxy,
}

/// Where the local backend reads its blobs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Directory(PathBuf),
    Bucket(String),
}

impl DataSource {
    pub fn from_options(
        data_dir: Option<PathBuf>,
        bucket_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        match (data_dir, bucket_url) {
            (Some(dir), None) => Ok(DataSource::Directory(dir)),
            (None, Some(url)) => Ok(DataSource::Bucket(url)),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingDataSource),
            (None, None) => Err(ConfigError::MissingDataSource),
        }
    }
}

/// File-backed configuration. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Blob keys read at startup by the local backend
    #[serde(default)]
    pub resources: ResourceKeys,

    /// Feature id stored in row 0 of the top effects table
    #[serde(default)]
    pub effects_offset: i64,

    /// Timeout for each startup blob fetch from a bucket
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Upstream settings for the proxy backend
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resources: ResourceKeys::default(),
            effects_offset: 0,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            proxy: ProxyConfig::default(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKeys {
    #[serde(default = "default_cos_sim_indices")]
    pub cos_sim_indices: String,
    #[serde(default = "default_cos_sim_values")]
    pub cos_sim_values: String,
    #[serde(default = "default_top_indices")]
    pub top_indices: String,
    #[serde(default = "default_top_values")]
    pub top_values: String,
    /// Feature id -> autointerp description
    #[serde(default = "default_descriptions")]
    pub descriptions: String,
    /// `[name, ...]` records used for search
    #[serde(default = "default_records")]
    pub records: String,
}

impl Default for ResourceKeys {
    fn default() -> Self {
        Self {
            cos_sim_indices: default_cos_sim_indices(),
            cos_sim_values: default_cos_sim_values(),
            top_indices: default_top_indices(),
            top_values: default_top_values(),
            descriptions: default_descriptions(),
            records: default_records(),
        }
    }
}

fn default_cos_sim_indices() -> String {
    "cosine_sim_indices.pt".to_string()
}

fn default_cos_sim_values() -> String {
    "cosine_sim_values.pt".to_string()
}

fn default_top_indices() -> String {
    "top_is.pt".to_string()
}

fn default_top_values() -> String {
    "top_vs.pt".to_string()
}

fn default_descriptions() -> String {
    "new_autointerp.json".to_string()
}

fn default_records() -> String {
    "autointerp.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL used when IS_PRODUCTION is true
    #[serde(default)]
    pub production_url: Option<String>,

    /// Base URL used otherwise
    #[serde(default)]
    pub development_url: Option<String>,

    /// Per-request timeout for upstream calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            production_url: None,
            development_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl ProxyConfig {
    /// The upstream base URL for the selected target.
    pub fn upstream_url(&self, production: bool) -> Result<&str, ConfigError> {
        let (url, target) = if production {
            (&self.production_url, "production")
        } else {
            (&self.development_url, "development")
        };
        url.as_deref().ok_or(ConfigError::MissingUpstream(target))
    }
}

impl Config {
    /// Load configuration from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::info!("No config file given, using defaults");
            return Ok(Config::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

/// Interpret an IS_PRODUCTION style flag. Only a case-insensitive "true" counts.
pub fn is_production(flag: Option<&str>) -> bool {
    flag.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

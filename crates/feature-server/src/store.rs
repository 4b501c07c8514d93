//! Blob stores holding the tensors and JSON documents read at startup.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

use crate::config::DataSource;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} fetching {url}")]
    Status { status: u16, url: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read-only access to named blobs.
///
/// Implementations: `LocalStore` (directory), `HttpStore` (object storage
/// bucket reachable over HTTP).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable location, for logs
    fn location(&self) -> String;

    /// Fetch the raw bytes stored under `key`.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

/// Blobs stored as files in a directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key);
        fs::read(&path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}

/// Blobs served at `{base_url}/{key}`.
///
/// Requests are plain unauthenticated GETs, so the bucket must be public or
/// fronted by a presigning or authenticating endpoint.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl BlobStore for HttpStore {
    fn location(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.url(key);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Open the store a data source points at.
pub fn open_store(source: &DataSource, timeout: Duration) -> Result<Box<dyn BlobStore>> {
    Ok(match source {
        DataSource::Directory(dir) => Box::new(LocalStore::new(dir.clone())),
        DataSource::Bucket(url) => Box::new(HttpStore::new(url.clone(), timeout)?),
    })
}

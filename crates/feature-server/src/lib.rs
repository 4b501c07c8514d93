//! feature-server library: routes, backends and startup loading.
//!
//! The binary in `main.rs` wires these together; integration tests drive
//! the router directly.

pub mod backend;
pub mod config;
pub mod error;
pub mod loader;
pub mod routes;
pub mod store;

use std::sync::Arc;

pub use backend::{FeatureBackend, LocalBackend, ProxyBackend};
pub use config::{BackendKind, Config, ConfigError, DataSource, ResourceKeys};
pub use error::{ApiError, ErrorBody};
pub use loader::{LoadError, load_dataset};
pub use routes::router;
pub use store::{BlobStore, HttpStore, LocalStore, StoreError};

/// Shared application state
pub struct AppState {
    pub backend: Arc<dyn FeatureBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn FeatureBackend>) -> Arc<Self> {
        Arc::new(Self { backend })
    }
}

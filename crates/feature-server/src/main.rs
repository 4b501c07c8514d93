//! feature-server: HTTP service for feature similarity, effects and descriptions
//!
//! Provides:
//! - Cosine similarity neighbours per index
//! - Top effects per feature
//! - Autointerp descriptions
//! - Case-insensitive name search
//!
//! Runs either from tables loaded at startup (`local`) or by forwarding to
//! another deployment of itself (`proxy`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_server::config::is_production;
use feature_server::store::open_store;
use feature_server::{
    AppState, BackendKind, Config, DataSource, FeatureBackend, LocalBackend, ProxyBackend,
    load_dataset, router,
};

#[derive(Parser, Debug)]
#[command(name = "feature-server")]
#[command(about = "Serves precomputed feature similarity and interpretability data")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 5000, env = "FEATURE_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "FEATURE_BIND")]
    bind: String,

    /// Answer from local tables or forward to an upstream deployment
    #[arg(long, value_enum, default_value_t = BackendKind::Local, env = "FEATURE_BACKEND")]
    backend: BackendKind,

    /// Optional JSON config file (resource keys, offset, upstream URLs)
    #[arg(long, env = "FEATURE_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Directory holding the data blobs
    #[arg(long, env = "FEATURE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Object storage bucket URL holding the data blobs
    #[arg(long, env = "FEATURE_BUCKET_URL")]
    bucket_url: Option<String>,

    /// Feature id stored in row 0 of the top effects table
    #[arg(long, env = "FEATURE_EFFECTS_OFFSET", allow_negative_numbers = true)]
    effects_offset: Option<i64>,

    /// Timeout for each blob fetched from the bucket at startup, in seconds
    #[arg(long, env = "FEATURE_FETCH_TIMEOUT_SECS")]
    fetch_timeout_secs: Option<u64>,

    /// "true" selects the production upstream, anything else development
    #[arg(long, env = "IS_PRODUCTION")]
    is_production: Option<String>,

    /// Upstream base URL used in production
    #[arg(long, env = "PROXY_PRODUCTION_URL")]
    production_url: Option<String>,

    /// Upstream base URL used in development
    #[arg(long, env = "PROXY_DEVELOPMENT_URL")]
    development_url: Option<String>,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "PROXY_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl Cli {
    /// File config with command line / environment values layered on top.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config_path.as_deref())?;

        if let Some(offset) = self.effects_offset {
            config.effects_offset = offset;
        }
        if let Some(secs) = self.fetch_timeout_secs {
            config.fetch_timeout_secs = secs;
        }
        if let Some(url) = &self.production_url {
            config.proxy.production_url = Some(url.clone());
        }
        if let Some(url) = &self.development_url {
            config.proxy.development_url = Some(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.proxy.timeout_secs = secs;
        }

        Ok(config)
    }
}

async fn build_backend(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn FeatureBackend>> {
    match cli.backend {
        BackendKind::Local => {
            let source = DataSource::from_options(cli.data_dir.clone(), cli.bucket_url.clone())?;
            let store = open_store(&source, Duration::from_secs(config.fetch_timeout_secs))?;
            let data = load_dataset(store.as_ref(), &config.resources, config.effects_offset)
                .await
                .context("Failed to load feature data")?;
            Ok(Arc::new(LocalBackend::new(Arc::new(data))))
        }
        BackendKind::Proxy => {
            let production = is_production(cli.is_production.as_deref());
            let upstream = config.proxy.upstream_url(production)?;
            tracing::info!(
                "Proxying to {} upstream {}",
                if production { "production" } else { "development" },
                upstream
            );
            let backend =
                ProxyBackend::new(upstream, Duration::from_secs(config.proxy.timeout_secs))?;
            Ok(Arc::new(backend))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feature_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    // Everything is loaded before the listener is bound
    let backend = build_backend(&cli, &config).await?;
    let app = router(AppState::new(backend));

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    tracing::info!("Starting feature-server ({:?} backend) on {}", cli.backend, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Feature server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! CropAI API Server
//!
//! REST API for crop disease prediction from leaf images and model metadata
//! submission.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use storage::DocumentStore;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod routes;

pub use crate::config::ServiceConfig;
pub use error::ApiError;

use crate::config::{LoggingConfig, MetricsConfig};

/// Read-only service context shared by all handlers
pub struct AppState {
    /// Loaded classifier
    pub engine: Arc<InferenceEngine>,
    /// Submission store
    pub store: Arc<dyn DocumentStore>,
    /// Collection receiving submissions
    pub collection: String,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(engine: InferenceEngine, store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            store,
            collection: collection.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::root::root))
        .route("/health", get(routes::root::health))
        .route("/predict", post(routes::predict::predict))
        .route("/submit_model/", post(routes::submissions::submit_model))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level {:?}", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

/// Install the Prometheus exporter when an address is configured
pub fn init_metrics(config: &MetricsConfig) -> anyhow::Result<()> {
    let Some(addr) = &config.prometheus_addr else {
        return Ok(());
    };

    let addr: SocketAddr = addr.parse()?;
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

/// Run the server until Ctrl-C or SIGTERM
pub async fn run_server(addr: &str, state: Arc<AppState>, max_upload_bytes: usize) -> anyhow::Result<()> {
    let app = create_router(state, max_upload_bytes);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}

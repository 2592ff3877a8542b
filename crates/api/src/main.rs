//! CropAI Backend - Main Entry Point

use anyhow::Context;
use api::{init_logging, init_metrics, run_server, AppState, ServiceConfig};
use inference_engine::InferenceEngine;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging)?;
    init_metrics(&config.metrics).context("failed to start metrics exporter")?;

    info!("=== CropAI Backend v{} ===", env!("CARGO_PKG_VERSION"));

    // Model and labels must load before any request is served
    let engine = InferenceEngine::load(config.model.clone()).context("failed to load model")?;
    let store = storage::connect(&config.store)
        .await
        .context("failed to connect document store")?;

    let state = Arc::new(AppState::new(engine, store, config.store.collection.clone()));
    run_server(&config.server.addr, state, config.server.max_upload_bytes).await
}

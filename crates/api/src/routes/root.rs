//! Welcome and health routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

pub const WELCOME_MESSAGE: &str =
    "Welcome to CropAI Backend. Use /predict to get disease predictions.";

/// Static message body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Welcome message
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: WELCOME_MESSAGE,
    })
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub labels: usize,
    pub store: &'static str,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        labels: state.engine.labels().len(),
        store: state.store.backend_name(),
    })
}

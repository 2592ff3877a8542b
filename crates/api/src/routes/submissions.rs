//! Model metadata submission route

use axum::{extract::State, Json};
use std::sync::Arc;
use storage::{ModelSubmission, SubmissionRecord};
use tracing::info;

use super::root::MessageResponse;
use crate::{error::ApiError, AppState};

pub const SUBMISSION_MESSAGE: &str = "Model metadata submitted successfully!";

/// Persist submitted model metadata with a server-side timestamp
pub async fn submit_model(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<ModelSubmission>,
) -> Result<Json<MessageResponse>, ApiError> {
    let name = submission.name.clone();
    let record = SubmissionRecord::now(submission);

    let id = state
        .store
        .create_document(&state.collection, record.into_document())
        .await?;

    metrics::counter!("cropai_submissions_total").increment(1);
    info!(
        "Stored submission {:?} as {}/{} ({})",
        name,
        state.collection,
        id,
        state.store.backend_name()
    );

    Ok(Json(MessageResponse {
        message: SUBMISSION_MESSAGE,
    }))
}

//! Disease prediction route

use axum::{
    extract::{Multipart, State},
    Json,
};
use inference_engine::{decode_image, Prediction};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{error::ApiError, AppState};

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predictions: Vec<Prediction>,
}

/// Whether the filename carries an accepted image extension (case-insensitive)
pub fn has_image_extension(filename: &str) -> bool {
    let filename = filename.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// Classify an uploaded leaf image
pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // Only the name is checked; content is sniffed at decode time
        let filename = field.file_name().unwrap_or_default().to_string();
        if !has_image_extension(&filename) {
            return Err(ApiError::InvalidFileType);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        info!("Received {} ({} bytes) for prediction", filename, bytes.len());

        let engine = Arc::clone(&state.engine);
        let predictions = tokio::task::spawn_blocking(move || {
            let image = decode_image(&bytes)?;
            engine.predict(&image)
        })
        .await
        .map_err(|e| ApiError::Model(e.to_string()))??;

        metrics::counter!("cropai_predictions_total").increment(1);
        if let Some(top) = predictions.first() {
            info!("Top prediction for {}: {} ({:.3})", filename, top.label, top.confidence);
        }

        return Ok(Json(PredictionResponse { predictions }));
    }

    Err(ApiError::MissingUpload)
}

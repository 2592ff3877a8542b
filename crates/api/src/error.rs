//! API error kinds and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::InferenceError;
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload filename is not .jpg, .jpeg or .png
    #[error("Invalid file type. Upload a JPG or PNG image.")]
    InvalidFileType,

    /// Multipart form has no `file` field
    #[error("Missing upload field 'file'")]
    MissingUpload,

    /// Reading the uploaded body failed
    #[error("Prediction failed: {0}")]
    Upload(String),

    /// Uploaded bytes are not a decodable image
    #[error("Prediction failed: {0}")]
    Decode(String),

    /// Model execution failed
    #[error("Prediction failed: {0}")]
    Model(String),

    /// Document store write failed
    #[error("Submission failed: {0}")]
    Store(String),

    /// Anything not classified above
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFileType => StatusCode::BAD_REQUEST,
            ApiError::MissingUpload => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload(_)
            | ApiError::Decode(_)
            | ApiError::Model(_)
            | ApiError::Store(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used in the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidFileType => "invalid_file_type",
            ApiError::MissingUpload => "missing_upload",
            ApiError::Upload(_) => "upload",
            ApiError::Decode(_) => "decode",
            ApiError::Model(_) => "model",
            ApiError::Store(_) => "store",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Decode(msg) => ApiError::Decode(msg),
            other => ApiError::Model(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!(kind = self.kind(), "{}", detail);
        } else {
            warn!(kind = self.kind(), "{}", detail);
        }
        metrics::counter!("cropai_api_errors_total", "kind" => self.kind()).increment(1);

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

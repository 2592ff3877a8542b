//! Crop Disease Inference Engine
//!
//! Image classification over an ONNX export of the CropAI network using tract-onnx:
//! - Label mapping loaded from a JSON index file
//! - Image decoding and 224x224 preprocessing
//! - Top-K selection with deterministic tie-breaking

mod config;
mod engine;
mod labels;
mod model;
mod preprocess;

pub use config::{EngineConfig, InputLayout, ResizeFilter};
pub use engine::{top_k, InferenceEngine, Prediction};
pub use labels::{LabelMap, UNKNOWN_LABEL};
pub use model::{FixedScores, ScoreModel, TractModel};
pub use preprocess::{decode_image, to_input_tensor};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Label mapping invalid: {0}")]
    Labels(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

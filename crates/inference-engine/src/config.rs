//! Engine configuration

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Memory layout of the model's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    /// Batch, height, width, channels (Keras/TensorFlow exports)
    Nhwc,
    /// Batch, channels, height, width (PyTorch exports)
    Nchw,
}

/// Resampling filter used when resizing to the model input size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Inference engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the ONNX model artifact
    pub model_path: String,

    /// Path to the JSON label mapping (`{"0": "label", ...}`)
    pub labels_path: String,

    /// Square input resolution expected by the model
    pub input_size: u32,

    /// Input tensor layout
    pub layout: InputLayout,

    /// Resize filter
    pub resize_filter: ResizeFilter,

    /// Number of predictions returned per image
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: "model/mobilenetv2_cropai.onnx".to_string(),
            labels_path: "model/class_indices.json".to_string(),
            input_size: 224,
            layout: InputLayout::Nhwc,
            resize_filter: ResizeFilter::Triangle,
            top_k: 3,
        }
    }
}

impl EngineConfig {
    /// Shape of the batched input tensor for this configuration
    pub fn input_shape(&self) -> [usize; 4] {
        let size = self.input_size as usize;
        match self.layout {
            InputLayout::Nhwc => [1, size, size, 3],
            InputLayout::Nchw => [1, 3, size, size],
        }
    }
}

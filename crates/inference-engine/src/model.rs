//! Score models: the tract-backed ONNX runner and a fixed-output stand-in

use ndarray::Array4;
use tract_onnx::prelude::*;
use tracing::info;

use crate::{EngineConfig, InferenceError};

/// Anything that turns a preprocessed batch of one image into class scores
pub trait ScoreModel: Send + Sync {
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

type Plan = TypedRunnableModel<TypedModel>;

/// ONNX model compiled into an optimized tract plan
pub struct TractModel {
    plan: Plan,
    input_shape: [usize; 4],
}

impl TractModel {
    /// Load and optimize the model, pinning its input to the configured shape
    pub fn load(config: &EngineConfig) -> Result<Self, InferenceError> {
        let input_shape = config.input_shape();
        info!(
            "Loading ONNX model from {} with input shape {:?}",
            config.model_path, input_shape
        );

        let load_err = |e: TractError| InferenceError::ModelLoad(format!("{}: {}", config.model_path, e));

        let plan = tract_onnx::onnx()
            .model_for_path(&config.model_path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact(input_shape).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        info!("Model loaded successfully");
        Ok(Self { plan, input_shape })
    }
}

impl ScoreModel for TractModel {
    fn scores(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        if input.shape() != self.input_shape {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{:?}", self.input_shape),
                actual: format!("{:?}", input.shape()),
            });
        }

        let data = input.as_slice().ok_or_else(|| {
            InferenceError::InferenceFailed("input tensor is not contiguous".to_string())
        })?;
        let tensor = Tensor::from_shape(&self.input_shape, data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        let scores = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }
}

/// Returns the same score vector for every input
#[derive(Debug, Clone)]
pub struct FixedScores(pub Vec<f32>);

impl ScoreModel for FixedScores {
    fn scores(&self, _input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }
}

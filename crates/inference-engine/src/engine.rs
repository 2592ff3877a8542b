//! Inference Engine Implementation

use std::cmp::Ordering;
use std::time::Instant;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{FixedScores, ScoreModel, TractModel};
use crate::preprocess::to_input_tensor;
use crate::{EngineConfig, InferenceError, LabelMap};

/// One ranked class prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable class label
    pub label: String,
    /// Raw model score for this class
    pub confidence: f64,
}

/// Image classifier: a score model plus its label mapping.
///
/// Immutable once constructed, so a single instance can serve any number of
/// concurrent requests behind an `Arc`.
pub struct InferenceEngine {
    config: EngineConfig,
    model: Box<dyn ScoreModel>,
    labels: LabelMap,
}

impl InferenceEngine {
    /// Load the ONNX model and label mapping named by `config`
    pub fn load(config: EngineConfig) -> Result<Self, InferenceError> {
        info!("Creating inference engine with model: {}", config.model_path);
        let labels = LabelMap::from_path(&config.labels_path)?;
        let model = TractModel::load(&config)?;
        Ok(Self::with_model(config, Box::new(model), labels))
    }

    /// Build an engine around an already constructed score model
    pub fn with_model(config: EngineConfig, model: Box<dyn ScoreModel>, labels: LabelMap) -> Self {
        if labels.is_empty() {
            warn!("Label mapping is empty; every prediction will be labelled unknown");
        }
        Self {
            config,
            model,
            labels,
        }
    }

    /// Create a mock engine that reports `scores` for every image
    pub fn mock(scores: Vec<f32>, labels: LabelMap) -> Self {
        info!("Creating mock inference engine");
        Self::with_model(EngineConfig::default(), Box::new(FixedScores(scores)), labels)
    }

    /// Classify an RGB image, returning the top-K labels by descending score
    pub fn predict(&self, image: &RgbImage) -> Result<Vec<Prediction>, InferenceError> {
        let start = Instant::now();

        let input = to_input_tensor(image, &self.config);
        let scores = self.model.scores(input)?;

        let predictions = top_k(&scores, self.config.top_k)
            .into_iter()
            .map(|(index, score)| Prediction {
                label: self.labels.label(index).to_string(),
                confidence: f64::from(score),
            })
            .collect();

        let elapsed = start.elapsed();
        metrics::histogram!("cropai_inference_seconds").record(elapsed.as_secs_f64());
        debug!(
            "Inference over {} classes completed in {}ms",
            scores.len(),
            elapsed.as_millis()
        );

        Ok(predictions)
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }
}

/// Indices and scores of the `k` highest scores, highest first.
///
/// Equal scores keep ascending index order.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    ranked.truncate(k);
    ranked
}

//! Class index to label mapping

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::InferenceError;

/// Label substituted for indices missing from the mapping
pub const UNKNOWN_LABEL: &str = "unknown";

/// Read-only mapping from model output index to human-readable label
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: HashMap<usize, String>,
}

impl LabelMap {
    /// Load the mapping from a JSON file with string-encoded integer keys
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::Labels(format!("{}: {}", path.display(), e)))?;
        let labels = Self::from_json_str(&raw)?;
        info!("Loaded {} labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Parse the mapping from JSON text
    pub fn from_json_str(raw: &str) -> Result<Self, InferenceError> {
        let entries: HashMap<String, String> =
            serde_json::from_str(raw).map_err(|e| InferenceError::Labels(e.to_string()))?;

        let labels = entries
            .into_iter()
            .map(|(key, label)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, label))
                    .map_err(|_| InferenceError::Labels(format!("non-integer class index {:?}", key)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self { labels })
    }

    /// Label for `index`, or [`UNKNOWN_LABEL`] when unmapped
    pub fn label(&self, index: usize) -> &str {
        self.labels
            .get(&index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(i, l)| (i, l.into())).collect(),
        }
    }
}

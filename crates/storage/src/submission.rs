//! Model submission records

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Document, FieldValue};

/// Collection that receives model submissions
pub const SUBMISSIONS_COLLECTION: &str = "model_submissions";

/// Model metadata submitted by a contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSubmission {
    pub name: String,
    pub crop_type: String,
    pub accuracy: f64,
    pub description: Option<String>,
    pub github_url: Option<String>,
}

/// A submission stamped with its server-side receive time
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub submission: ModelSubmission,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(submission: ModelSubmission, submitted_at: DateTime<Utc>) -> Self {
        Self {
            submission,
            submitted_at,
        }
    }

    /// Stamp a submission with the current UTC time
    pub fn now(submission: ModelSubmission) -> Self {
        Self::new(submission, Utc::now())
    }

    /// Persisted document; absent optional fields are stored as nulls
    pub fn into_document(self) -> Document {
        let ModelSubmission {
            name,
            crop_type,
            accuracy,
            description,
            github_url,
        } = self.submission;

        let submitted_at = iso_timestamp(&self.submitted_at);

        Document::from([
            ("name".to_string(), FieldValue::from(name)),
            ("crop_type".to_string(), FieldValue::from(crop_type)),
            ("accuracy".to_string(), FieldValue::from(accuracy)),
            ("description".to_string(), FieldValue::from(description)),
            ("github_url".to_string(), FieldValue::from(github_url)),
            ("submitted_at".to_string(), FieldValue::from(submitted_at)),
        ])
    }
}

/// Naive ISO 8601 UTC time; microseconds only when nonzero
fn iso_timestamp(at: &DateTime<Utc>) -> String {
    let seconds = at.format("%Y-%m-%dT%H:%M:%S");
    match at.nanosecond() / 1_000 {
        0 => seconds.to_string(),
        micros => format!("{}.{:06}", seconds, micros % 1_000_000),
    }
}

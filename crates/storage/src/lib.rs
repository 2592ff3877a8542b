//! Storage Layer
//!
//! Document store access for model submissions, behind the [`DocumentStore`]
//! trait so handlers can run against Firestore or an in-memory store.

mod config;
mod credentials;
mod document;
mod firestore;
mod memory;
mod submission;

pub use config::{connect, FirestoreConfig, StoreBackend, StoreConfig};
pub use credentials::{Credentials, ServiceAccountAuth, ServiceAccountKey};
pub use document::{Document, FieldValue};
pub use firestore::FirestoreStore;
pub use memory::{MemoryStore, StoredDocument, DEFAULT_MAX_DOCUMENTS};
pub use submission::{ModelSubmission, SubmissionRecord, SUBMISSIONS_COLLECTION};

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Document store returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// A schema-flexible store addressed by collection and document id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a new document with a store-generated id and return that id
    async fn create_document(&self, collection: &str, fields: Document) -> Result<String, StorageError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

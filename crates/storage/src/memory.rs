//! In-memory document store

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Document, DocumentStore, StorageError};

/// A document as held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Documents kept per collection unless configured otherwise
pub const DEFAULT_MAX_DOCUMENTS: usize = 10_000;

/// Process-local document store, used for development and tests.
///
/// Each collection keeps at most `max_documents` entries; the oldest are
/// evicted first.
pub struct MemoryStore {
    /// Documents per collection, in insertion order
    collections: Mutex<HashMap<String, VecDeque<StoredDocument>>>,
    max_documents: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_DOCUMENTS)
    }

    pub fn with_retention(max_documents: usize) -> Self {
        info!(
            "Creating in-memory document store (max {} documents per collection)",
            max_documents
        );
        Self {
            collections: Mutex::new(HashMap::new()),
            max_documents: max_documents.max(1),
        }
    }

    /// All documents of a collection, oldest first
    pub fn documents(&self, collection: &str) -> Result<Vec<StoredDocument>, StorageError> {
        let collections = self
            .collections
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut collections) = self.collections.lock() {
            collections.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, collection: &str, fields: Document) -> Result<String, StorageError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let id = Uuid::new_v4().simple().to_string();
        let docs = collections.entry(collection.to_string()).or_default();

        // Enforce retention
        while docs.len() >= self.max_documents {
            docs.pop_front();
        }
        docs.push_back(StoredDocument {
            id: id.clone(),
            fields,
        });

        debug!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;

    fn doc(name: &str) -> Document {
        Document::from([("name".to_string(), FieldValue::from(name))])
    }

    #[tokio::test]
    async fn test_insert_and_retrieve() {
        let store = MemoryStore::new();

        let id = store.create_document("model_submissions", doc("PlantVillage CNN")).await.unwrap();

        let docs = store.documents("model_submissions").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].fields["name"].as_str(), Some("PlantVillage CNN"));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.create_document("c", doc("a")).await.unwrap();
        let b = store.create_document("c", doc("b")).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.document_count("c"), 2);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryStore::new();
        store.create_document("a", doc("x")).await.unwrap();

        assert_eq!(store.document_count("b"), 0);
        store.clear();
        assert_eq!(store.document_count("a"), 0);
    }

    #[tokio::test]
    async fn test_retention_limit() {
        let store = MemoryStore::with_retention(3);

        for name in ["a", "b", "c", "d", "e"] {
            store.create_document("c", doc(name)).await.unwrap();
        }

        let names: Vec<_> = store
            .documents("c")
            .unwrap()
            .into_iter()
            .map(|d| d.fields["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["c", "d", "e"]);
    }
}

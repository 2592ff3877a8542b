//! Firestore REST document store

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::document::to_firestore_fields;
use crate::{Credentials, Document, DocumentStore, StorageError};

#[derive(Deserialize)]
struct CreatedDocument {
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`
    name: String,
}

/// Firestore client speaking the v1 REST API
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    database: String,
    credentials: Credentials,
}

impl FirestoreStore {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        database: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let store = Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database: database.into(),
            credentials,
        };
        info!(
            "Firestore store for project {} ({}) at {}",
            store.project_id, store.database, store.base_url
        );
        store
    }

    /// Endpoint that creates documents with server-assigned ids
    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, collection
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create_document(&self, collection: &str, fields: Document) -> Result<String, StorageError> {
        let body = json!({ "fields": to_firestore_fields(&fields) });

        let mut request = self.client.post(self.collection_url(collection)).json(&body);
        if let Some(token) = self.credentials.bearer_token(&self.client).await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let id = created
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                StorageError::SerializationError(format!("unexpected document name {:?}", created.name))
            })?
            .to_string();

        debug!("Created document {}/{}", collection, id);
        Ok(id)
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}

//! Store configuration and construction

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Credentials, DocumentStore, FirestoreStore, MemoryStore, ServiceAccountAuth, ServiceAccountKey,
    StorageError, DEFAULT_MAX_DOCUMENTS, SUBMISSIONS_COLLECTION,
};

/// Token accepted by the Firestore emulator
const EMULATOR_TOKEN: &str = "owner";

/// Which document store backs submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Firestore,
}

/// Firestore connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirestoreConfig {
    /// Project id; falls back to the service-account key's project
    pub project_id: Option<String>,
    /// Database id
    pub database: String,
    /// REST API root
    pub base_url: String,
    /// Service-account key file
    pub credentials_path: Option<String>,
    /// Pre-issued bearer token, used when no key file is configured
    pub access_token: Option<String>,
    /// `host:port` of a local emulator; overrides the other settings
    pub emulator_host: Option<String>,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database: "(default)".to_string(),
            base_url: "https://firestore.googleapis.com".to_string(),
            credentials_path: None,
            access_token: None,
            emulator_host: None,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Collection receiving model submissions
    pub collection: String,
    pub firestore: FirestoreConfig,
    /// Per-collection retention of the memory backend
    pub memory_max_documents: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Firestore,
            collection: SUBMISSIONS_COLLECTION.to_string(),
            firestore: FirestoreConfig::default(),
            memory_max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }
}

/// Build the configured document store
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StorageError> {
    match config.backend {
        StoreBackend::Memory => {
            warn!(
                "Using in-memory document store; submissions are lost on restart and only the newest {} per collection are kept",
                config.memory_max_documents
            );
            Ok(Arc::new(MemoryStore::with_retention(config.memory_max_documents)))
        }
        StoreBackend::Firestore => Ok(Arc::new(connect_firestore(&config.firestore).await?)),
    }
}

async fn connect_firestore(config: &FirestoreConfig) -> Result<FirestoreStore, StorageError> {
    let missing_project = || StorageError::Config("firestore.project_id is not set".to_string());

    if let Some(host) = &config.emulator_host {
        info!("Using Firestore emulator at {}", host);
        let project = config.project_id.clone().ok_or_else(missing_project)?;
        return Ok(FirestoreStore::new(
            format!("http://{}", host),
            project,
            config.database.clone(),
            Credentials::Bearer(EMULATOR_TOKEN.to_string()),
        ));
    }

    if let Some(path) = &config.credentials_path {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::Config(format!("{}: {}", path, e)))?;
        let key = ServiceAccountKey::from_json_str(&raw)?;
        let project = config
            .project_id
            .clone()
            .or_else(|| key.project_id.clone())
            .ok_or_else(missing_project)?;
        return Ok(FirestoreStore::new(
            config.base_url.clone(),
            project,
            config.database.clone(),
            Credentials::ServiceAccount(ServiceAccountAuth::new(key)),
        ));
    }

    if let Some(token) = &config.access_token {
        let project = config.project_id.clone().ok_or_else(missing_project)?;
        return Ok(FirestoreStore::new(
            config.base_url.clone(),
            project,
            config.database.clone(),
            Credentials::Bearer(token.clone()),
        ));
    }

    Err(StorageError::Config(
        "no Firestore credentials configured (credentials_path, access_token or emulator_host)".to_string(),
    ))
}

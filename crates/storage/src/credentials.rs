//! Document store credentials
//!
//! Service-account keys are exchanged for OAuth access tokens with the
//! JWT-bearer grant; tokens are cached until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::StorageError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key file contents (the fields this service needs)
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json_str(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw)
            .map_err(|e| StorageError::Config(format!("invalid service account key: {}", e)))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Access-token source backed by a service-account key
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Self {
        info!("Using service account {}", key.client_email);
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    /// Signed RS256 assertion for the token endpoint
    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, StorageError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StorageError::Auth(format!("invalid private key: {}", e)))?;

        encode(&header, &claims, &key).map_err(|e| StorageError::Auth(e.to_string()))
    }

    /// Current access token, fetching a new one when the cached one is near expiry
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, StorageError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.token.clone());
            }
        }

        let assertion = self.sign_assertion(now)?;
        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Auth(format!("malformed token response: {}", e)))?;

        debug!("Fetched access token valid for {}s", token.expires_in);
        let fresh = CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        };
        let value = fresh.token.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

/// How requests to the document store authenticate
pub enum Credentials {
    /// No authorization header
    Anonymous,
    /// Fixed bearer token
    Bearer(String),
    /// Tokens minted from a service-account key
    ServiceAccount(ServiceAccountAuth),
}

impl Credentials {
    /// Bearer token to attach, if any
    pub async fn bearer_token(&self, client: &reqwest::Client) -> Result<Option<String>, StorageError> {
        match self {
            Credentials::Anonymous => Ok(None),
            Credentials::Bearer(token) => Ok(Some(token.clone())),
            Credentials::ServiceAccount(auth) => auth.access_token(client).await.map(Some),
        }
    }
}

//! Service configuration
//!
//! Layered with the `config` crate: an optional file (`CROPAI_CONFIG`, default
//! `config/cropai.{toml,yaml,json}`), then `CROPAI_*` environment variables
//! using `__` as the section separator, e.g. `CROPAI_SERVER__ADDR=0.0.0.0:9000`.

use config::{Config, ConfigError, Environment, File};
use inference_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use storage::StoreConfig;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "CROPAI_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/cropai";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Metrics settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Address for the Prometheus scrape endpoint; disabled when unset
    pub prometheus_addr: Option<String>,
}

/// Full service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub model: EngineConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl ServiceConfig {
    /// Load from the file named by `CROPAI_CONFIG` (if any) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// Load from an explicit file path plus the environment.
    ///
    /// An explicitly named file must exist; the default path is optional.
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("CROPAI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

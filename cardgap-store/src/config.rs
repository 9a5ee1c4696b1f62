//! Configuration management.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{FileBackend, MemoryBackend};
use crate::checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_TTL_HOURS};
use crate::error::StoreError;
use crate::persistence::{default_cache_dir, default_config_path, load_json, save_json};
use crate::sqlite::SqliteBackend;

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "ALTERED_API_URL";
/// Environment variable carrying the bearer token.
pub const ENV_AUTH_TOKEN: &str = "ALTERED_AUTH_TOKEN";
/// Environment variable overriding the checkpoint directory.
pub const ENV_CACHE_DIR: &str = "CARDGAP_CACHE_DIR";

/// File name of the SQLite database inside the cache directory.
const SQLITE_FILE: &str = "checkpoints.db";

// ============================================================================
// Backend Kind
// ============================================================================

/// Which checkpoint backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per record.
    #[default]
    File,
    /// Embedded SQLite database.
    Sqlite,
    /// Nothing survives the process.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::Config(format!("unknown backend: {other}"))),
        }
    }
}

// ============================================================================
// App Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// API base URL.
    pub api_url: String,
    /// Bearer token. Read from the file or environment, never written back.
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    /// Locale sent with every request.
    pub locale: String,
    /// Items requested per page.
    pub page_size: u32,
    /// Pause between pages, in milliseconds.
    pub page_delay_ms: u64,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Checkpoint directory. Defaults to the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Hours before a checkpoint expires.
    pub cache_ttl_hours: i64,
    /// Checkpoint backend.
    pub backend: BackendKind,
    /// Copies of each card to aim for.
    pub target_count: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.altered.gg".to_string(),
            auth_token: None,
            locale: "fr-fr".to_string(),
            page_size: 100,
            page_delay_ms: 500,
            max_attempts: 3,
            timeout_secs: 30,
            cache_dir: None,
            cache_ttl_hours: DEFAULT_CHECKPOINT_TTL_HOURS,
            backend: BackendKind::File,
            target_count: 3,
        }
    }
}

impl AppConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path()).await
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Self = load_json(path).await?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            debug!(url = %url, "API URL from environment");
            self.api_url = url;
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            debug!("Auth token from environment");
            self.auth_token = Some(token);
        }
        if let Some(dir) = get(ENV_CACHE_DIR) {
            debug!(dir = %dir, "Cache directory from environment");
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the effective checkpoint directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Returns the checkpoint TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::try_hours(self.cache_ttl_hours.max(0)).unwrap_or(Duration::MAX)
    }

    /// Opens the configured checkpoint store.
    pub async fn open_store(&self) -> Result<CheckpointStore, StoreError> {
        let store = match self.backend {
            BackendKind::File => CheckpointStore::new(Arc::new(FileBackend::new(self.cache_dir()))),
            BackendKind::Sqlite => {
                let backend = SqliteBackend::open(&self.cache_dir().join(SQLITE_FILE)).await?;
                CheckpointStore::new(Arc::new(backend))
            }
            BackendKind::Memory => CheckpointStore::new(Arc::new(MemoryBackend::new())),
        };
        debug!(backend = %self.backend, "Opened checkpoint store");
        Ok(store.with_ttl(self.cache_ttl()))
    }
}

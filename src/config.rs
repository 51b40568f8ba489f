//! Configuration System
//!
//! Layered TOML configuration: built-in defaults, then the global XDG file,
//! then the workspace file, with an explicit `--config` file overriding both
//! file layers. Validation runs after loading.

use crate::error::HearthError;
use crate::fetch::FetcherOptions;
use crate::logging::LoggingConfig;
use config::{Config, File};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HearthConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory, resolved against the workspace root when relative.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".hearth/db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: default_db_path(),
        }
    }
}

/// Content cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for cached pages, in hours.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

fn default_max_age_hours() -> u64 {
    168
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_age_hours: default_max_age_hours(),
        }
    }
}

/// Page fetching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Fan-out width for batch reconciliation.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_user_agent() -> String {
    format!("hearth/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    4
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Storage(String),
    Cache(String),
    Fetch(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Fetch(msg) => write!(f, "Fetch: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl HearthConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage.db_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "db_path cannot be empty".to_string(),
            ));
        }
        if self.cache.max_age_hours == 0 {
            errors.push(ValidationError::Cache(
                "max_age_hours must be at least 1".to_string(),
            ));
        }
        if self.fetch.concurrency == 0 {
            errors.push(ValidationError::Fetch(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Database path resolved against the workspace root.
    pub fn db_path(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.db_path.is_absolute() {
            self.storage.db_path.clone()
        } else {
            workspace_root.join(&self.storage.db_path)
        }
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache.max_age_hours * 60 * 60)
    }

    pub fn fetcher_options(&self) -> FetcherOptions {
        FetcherOptions {
            user_agent: self.fetch.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
        }
    }
}

/// Path of the global configuration file, if a home directory exists.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("hearth").join("config.toml"))
}

/// Path of the workspace configuration file.
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".hearth").join("config.toml")
}

/// Loads configuration from the layered file sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, then the global file, then the workspace file.
    ///
    /// Both files are optional; later layers win.
    pub fn load(workspace_root: &Path) -> Result<HearthConfig, HearthError> {
        let mut builder = Config::builder();

        if let Some(global) = global_config_path() {
            debug!(path = %global.display(), "Considering global config file");
            builder = builder.add_source(File::from(global).required(false));
        }

        let workspace_file = workspace_config_path(workspace_root);
        debug!(path = %workspace_file.display(), "Considering workspace config file");
        builder = builder.add_source(File::from(workspace_file).required(false));

        let config: HearthConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load defaults plus exactly one explicit file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<HearthConfig, HearthError> {
        let config: HearthConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

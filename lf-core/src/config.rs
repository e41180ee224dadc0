//! Application configuration management.
//!
//! Handles loading, saving, and accessing the client configuration: the hosted
//! backend address and key, the image bucket, the local database and logging.
//! Configuration is persisted as TOML on disk; two environment variables can
//! override the backend connection.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::constants;
use crate::error::{LfError, LfResult};
use crate::platform::Platform;

/// Environment variable overriding `backend.url`.
pub const ENV_BACKEND_URL: &str = "LOSTFOUND_BACKEND_URL";

/// Environment variable overriding `backend.anon_key`.
pub const ENV_ANON_KEY: &str = "LOSTFOUND_ANON_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Object storage settings for item images.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output settings for the dashboards.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Hosted backend connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL (e.g., "https://abcdefgh.supabase.co").
    #[serde(default)]
    pub url: String,

    /// Anonymous API key sent with every request.
    #[serde(default)]
    pub anon_key: String,

    /// Extra HTTP headers as key-value pairs.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,

    /// API request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding item images.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Largest accepted image in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    /// Maximum number of images attached to one report.
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Cache-Control max-age sent with uploads, in seconds.
    #[serde(default = "default_cache_control")]
    pub cache_control_secs: u64,
}

/// Local database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Dashboard output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Number of rows in "recent" dashboard panels.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// chrono format string for timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

// Default value functions for serde

fn default_api_timeout() -> u64 {
    constants::DEFAULT_API_TIMEOUT_MS
}

fn default_bucket() -> String {
    constants::IMAGE_BUCKET.to_string()
}

fn default_max_image_bytes() -> u64 {
    constants::MAX_IMAGE_BYTES
}

fn default_max_images() -> usize {
    constants::MAX_IMAGES_PER_REPORT
}

fn default_cache_control() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_recent_limit() -> usize {
    constants::DEFAULT_RECENT_LIMIT
}

fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            custom_headers: HashMap::new(),
            api_timeout_ms: default_api_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_image_bytes: default_max_image_bytes(),
            max_images: default_max_images(),
            cache_control_secs: default_cache_control(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path, then apply
    /// environment overrides.
    pub fn load_default() -> LfResult<Self> {
        let path = Self::default_config_path()?;
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            info!("no config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> LfResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> LfResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| LfError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> LfResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Override backend settings from `LOSTFOUND_BACKEND_URL` and
    /// `LOSTFOUND_ANON_KEY` when they are set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            debug!("{ENV_BACKEND_URL} overrides backend.url");
            self.backend.url = url;
        }
        if let Some(key) = lookup(ENV_ANON_KEY).filter(|v| !v.trim().is_empty()) {
            debug!("{ENV_ANON_KEY} overrides backend.anon_key");
            self.backend.anon_key = key;
        }
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> LfResult<PathBuf> {
        if self.database.path.is_empty() {
            Ok(Platform::data_dir()?.join("lostfound.db"))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> LfResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Check whether the backend connection is configured.
    pub fn is_backend_configured(&self) -> bool {
        !self.backend.url.trim().is_empty() && !self.backend.anon_key.trim().is_empty()
    }

    /// Normalize a backend URL: strip quotes and whitespace, default to
    /// https, drop trailing slashes.
    pub fn sanitize_backend_url(url: &str) -> String {
        let trimmed = url.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        with_scheme.trim_end_matches('/').to_string()
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend.api_timeout_ms, 30_000);
        assert_eq!(config.storage.bucket, "item-images");
        assert_eq!(config.storage.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(config.storage.max_images, 3);
        assert!(config.database.wal_mode);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.display.recent_limit, 5);
        assert!(!config.is_backend_configured());
    }

    #[test]
    fn test_sanitize_backend_url() {
        assert_eq!(
            AppConfig::sanitize_backend_url("abcdefgh.supabase.co"),
            "https://abcdefgh.supabase.co"
        );
        assert_eq!(
            AppConfig::sanitize_backend_url("http://127.0.0.1:54321/"),
            "http://127.0.0.1:54321"
        );
        assert_eq!(
            AppConfig::sanitize_backend_url("  \"https://example.com/\"  "),
            "https://example.com"
        );
        assert_eq!(AppConfig::sanitize_backend_url("   "), "");
    }

    #[test]
    fn test_overrides_replace_backend_settings() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_BACKEND_URL => Some("https://campus.example.co".to_string()),
            ENV_ANON_KEY => Some("anon".to_string()),
            _ => None,
        });
        assert_eq!(config.backend.url, "https://campus.example.co");
        assert_eq!(config.backend.anon_key, "anon");
        assert!(config.is_backend_configured());
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = AppConfig::default();
        config.backend.url = "https://kept.example.co".into();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.backend.url, "https://kept.example.co");
    }

    #[test]
    fn test_roundtrip_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.backend.url = "https://campus.example.co".into();
        config.storage.max_images = 1;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.backend.url, "https://campus.example.co");
        assert_eq!(loaded.storage.max_images, 1);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[backend]\nurl = \"x.supabase.co\"\n").unwrap();
        assert_eq!(config.backend.url, "x.supabase.co");
        assert_eq!(config.backend.api_timeout_ms, 30_000);
        assert_eq!(config.storage.bucket, "item-images");
    }
}

//! Companion configuration
//!
//! Read from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use app_core::RetentionConfig;
use app_state::DebounceConfig;
use networking::CloudConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration JSON
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Companion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Preference database path; `None` keeps preferences in memory
    pub store_path: Option<PathBuf>,
    /// Delay before edits are written, in milliseconds
    pub persist_debounce_ms: u64,
    /// Delay before the keyboard is told to reload, in milliseconds
    pub notify_debounce_ms: u64,
    /// How long a finished download stays visible, in milliseconds
    pub download_completed_retention_ms: u64,
    /// How long a failed download stays visible, in milliseconds
    pub download_error_retention_ms: u64,
    /// Native call timeout, in milliseconds
    pub bridge_timeout_ms: u64,
    /// Language catalog asset
    pub catalog_path: Option<PathBuf>,
    /// Cloud sync; `None` disables it
    pub cloud: Option<CloudConfig>,
    /// Default log filter directive
    pub log_filter: String,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            persist_debounce_ms: 400,
            notify_debounce_ms: 300,
            download_completed_retention_ms: 1000,
            download_error_retention_ms: 3000,
            bridge_timeout_ms: 5000,
            catalog_path: None,
            cloud: None,
            log_filter: "info".to_string(),
        }
    }
}

impl CompanionConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values are usable
    pub fn validate(&self) -> Result<()> {
        if self.persist_debounce_ms == 0 || self.notify_debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce delays must be positive".to_string()));
        }
        if self.bridge_timeout_ms == 0 {
            return Err(ConfigError::Invalid("bridge_timeout_ms must be positive".to_string()));
        }
        if let Some(cloud) = &self.cloud {
            cloud.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Set the preference database path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set both debounce delays in milliseconds
    pub fn debounce_ms(mut self, persist: u64, notify: u64) -> Self {
        self.persist_debounce_ms = persist;
        self.notify_debounce_ms = notify;
        self
    }

    /// Set the native call timeout in milliseconds
    pub fn bridge_timeout_ms(mut self, ms: u64) -> Self {
        self.bridge_timeout_ms = ms;
        self
    }

    /// Set the language catalog asset
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Enable cloud sync
    pub fn cloud(mut self, cloud: CloudConfig) -> Self {
        self.cloud = Some(cloud);
        self
    }

    /// Debounce delays for controllers
    pub fn debounce(&self) -> DebounceConfig {
        DebounceConfig {
            persist: Duration::from_millis(self.persist_debounce_ms),
            notify: Duration::from_millis(self.notify_debounce_ms),
        }
    }

    /// Retention of finished downloads
    pub fn retention(&self) -> RetentionConfig {
        RetentionConfig {
            completed: Duration::from_millis(self.download_completed_retention_ms),
            error: Duration::from_millis(self.download_error_retention_ms),
        }
    }

    /// Native call timeout
    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.bridge_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = CompanionConfig::default();
        assert_eq!(config.debounce(), DebounceConfig::default());
        assert_eq!(config.retention(), RetentionConfig::default());
        assert!(config.cloud.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: CompanionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CompanionConfig::default());
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"persist_debounce_ms": 250,
                "cloud": {{"endpoint": "https://sync.example.com", "user_id": "u1"}}}}"#
        )
        .unwrap();

        let config = CompanionConfig::load(file.path()).unwrap();
        assert_eq!(config.persist_debounce_ms, 250);
        assert_eq!(config.notify_debounce_ms, 300);
        let cloud = config.cloud.unwrap();
        assert_eq!(cloud.user_id, "u1");
        assert_eq!(cloud.timeout_ms, 10_000);
    }

    #[test]
    fn test_missing_file() {
        let result = CompanionConfig::load(Path::new("/nonexistent/companion.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_rejects_zero_debounce() {
        let config = CompanionConfig::default().debounce_ms(0, 300);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_cloud_endpoint() {
        let config = CompanionConfig::default().cloud(CloudConfig::new("ftp://sync", "u1"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}

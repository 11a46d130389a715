//! Cloud sync client
//!
//! Settings documents are merged into a per-user remote store with an
//! HTTP `PUT`. The client reports success or failure and does nothing
//! else: no retry, no backoff, no response body handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Characters of a failed response body kept in the error
const MAX_ERROR_BODY: usize = 256;

/// Cloud sync errors
#[derive(Debug, Error)]
pub enum CloudError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected the document
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Configuration is unusable
    #[error("Invalid cloud configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for cloud operations
pub type Result<T> = std::result::Result<T, CloudError>;

/// A named settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDocument {
    /// Document name, e.g. `typing_settings`
    pub name: String,
    /// Canonical setting values
    pub settings: Map<String, Value>,
    /// When the document was produced
    pub updated_at: DateTime<Utc>,
}

impl SettingsDocument {
    /// Create a document stamped with the current time
    pub fn new(name: impl Into<String>, settings: Map<String, Value>) -> Self {
        Self { name: name.into(), settings, updated_at: Utc::now() }
    }
}

/// Remote settings store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CloudSyncClient: Send + Sync {
    /// Insert or merge a settings document
    async fn upsert(&self, document: SettingsDocument) -> Result<()>;
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Cloud sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Base URL of the settings service
    pub endpoint: String,
    /// User whose documents are written
    pub user_id: String,
    /// Bearer token, if the service needs one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl CloudConfig {
    /// Create a new configuration
    pub fn new(endpoint: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_id: user_id.into(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Set the bearer token
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set request timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(CloudError::InvalidConfig(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig("user_id is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(CloudError::InvalidConfig("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// HTTP cloud sync client
pub struct HttpCloudSync {
    client: reqwest::Client,
    config: CloudConfig,
}

impl HttpCloudSync {
    /// Create a client from configuration
    pub fn new(config: CloudConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    fn document_url(&self, name: &str) -> String {
        format!(
            "{}/users/{}/settings/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.user_id,
            name
        )
    }
}

#[async_trait]
impl CloudSyncClient for HttpCloudSync {
    async fn upsert(&self, document: SettingsDocument) -> Result<()> {
        let url = self.document_url(&document.name);
        let mut request = self.client.put(&url).json(&document);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            let cut = body.char_indices().nth(MAX_ERROR_BODY).map_or(body.len(), |(i, _)| i);
            body.truncate(cut);
            return Err(CloudError::Status { status: status.as_u16(), body });
        }

        tracing::debug!(document = %document.name, "cloud settings document upserted");
        Ok(())
    }
}

/// Client used when no cloud store is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCloudSync;

#[async_trait]
impl CloudSyncClient for DisabledCloudSync {
    async fn upsert(&self, document: SettingsDocument) -> Result<()> {
        tracing::trace!(document = %document.name, "cloud sync disabled, skipping upsert");
        Ok(())
    }
}

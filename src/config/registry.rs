//! Registry and model cache settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where models come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// MLflow tracking server URL, or a local registry directory
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,

    /// Model served by `/predict`
    #[serde(default = "default_model_uri")]
    pub model_uri: String,

    /// Per-request timeout for registry calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts when the registry is unreachable
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry delay, doubled on every attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_tracking_uri() -> String {
    "http://tracking_server:5000".to_string()
}

fn default_model_uri() -> String {
    "models:/gboost_regressor@champion".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tracking_uri: default_tracking_uri(),
            model_uri: default_model_uri(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Loaded-model cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a loaded model may be served; 0 reloads on every request
    #[serde(default)]
    pub ttl_secs: u64,

    /// Maximum resident models
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    1
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 0,
            max_entries: default_max_entries(),
        }
    }
}

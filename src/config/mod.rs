//! Configuration system for hrserve
//!
//! AppConfig collects server, registry, cache, feature schema, validation
//! and logging settings. It is read from a YAML or JSON file and then
//! patched from `HRSERVE_*` environment variables.

mod logging;
mod registry;
mod server;

pub use logging::{LogFormat, LoggingConfig};
pub use registry::{CacheConfig, RegistryConfig};
pub use server::{ErrorMapping, ServerConfig};

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::features::FeatureSchema;
use crate::registry::ModelUri;

pub const ENV_TRACKING_URI: &str = "HRSERVE_TRACKING_URI";
pub const ENV_MODEL_URI: &str = "HRSERVE_MODEL_URI";
pub const ENV_PORT: &str = "HRSERVE_PORT";

/// Request validation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Check every record against the feature schema before predicting.
    /// Off by default: records reach the model as sent.
    #[serde(default)]
    pub strict: bool,
}

/// hrserve configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Feature groups shared by training and inference
    #[serde(default)]
    pub schema: FeatureSchema,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file chosen by extension (defaults when `None`), apply
    /// environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            None => Self::default(),
            Some(path) => {
                let loaded = match path.extension().and_then(|e| e.to_str()) {
                    Some("json") => Self::from_json(path),
                    Some("yaml") | Some("yml") => Self::from_yaml(path),
                    _ => Err(anyhow!("config file must be .yaml, .yml or .json")),
                };
                loaded.with_context(|| format!("failed to load config {}", path.display()))?
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Patch settings from `HRSERVE_*` variables, read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(ENV_TRACKING_URI) {
            self.registry.tracking_uri = uri;
        }
        if let Some(uri) = lookup(ENV_MODEL_URI) {
            self.registry.model_uri = uri;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
        }
        Ok(())
    }

    /// Reject settings that would only fail later, at request time
    pub fn validate(&self) -> Result<()> {
        self.registry
            .model_uri
            .parse::<ModelUri>()
            .context("invalid registry.model_uri")?;
        if self.registry.tracking_uri.trim().is_empty() {
            return Err(anyhow!("registry.tracking_uri must not be empty"));
        }
        self.schema.validate().context("invalid schema")?;
        Ok(())
    }
}

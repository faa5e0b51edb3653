//! Model registry client
//!
//! Resolves `models:/<name>@<alias>` (or `models:/<name>/<version>`) to an
//! immutable model version and fetches its artifact. Two backends:
//!
//! - [`MlflowRegistry`]: MLflow tracking server REST API
//! - [`LocalRegistry`]: directory tree on disk
//!
//! Every failure to reach the registry or resolve a reference surfaces as
//! [`ServeError::RegistryUnavailable`].

mod local;
mod mlflow;

pub use local::LocalRegistry;
pub use mlflow::MlflowRegistry;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::{Result, ServeError};
use crate::loader;
use crate::model::ModelArtifact;

const URI_SCHEME: &str = "models:/";

/// How a model URI points at a version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelReference {
    /// Mutable pointer such as `champion`
    Alias(String),
    /// Immutable version number
    Version(u64),
}

/// Parsed `models:/` URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelUri {
    pub name: String,
    pub reference: ModelReference,
}

impl ModelUri {
    pub fn alias(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: ModelReference::Alias(alias.into()),
        }
    }
}

impl FromStr for ModelUri {
    type Err = ServeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            ServeError::invalid(format!(
                "model URI '{}' must look like models:/<name>@<alias> or models:/<name>/<version>",
                s
            ))
        };

        let rest = s.strip_prefix(URI_SCHEME).ok_or_else(invalid)?;
        let (name, reference) = if let Some((name, alias)) = rest.split_once('@') {
            (name, ModelReference::Alias(alias.to_string()))
        } else if let Some((name, version)) = rest.split_once('/') {
            let version = version.parse().map_err(|_| invalid())?;
            (name, ModelReference::Version(version))
        } else {
            return Err(invalid());
        };

        let bad_name = name.is_empty() || name.contains('/') || name.contains('@');
        let bad_alias = matches!(&reference, ModelReference::Alias(a) if a.is_empty() || a.contains('/'));
        if bad_name || bad_alias {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            reference,
        })
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            ModelReference::Alias(alias) => write!(f, "{}{}@{}", URI_SCHEME, self.name, alias),
            ModelReference::Version(v) => write!(f, "{}{}/{}", URI_SCHEME, self.name, v),
        }
    }
}

/// A concrete, immutable registered model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    /// Where the artifact lives, in the backend's own addressing
    pub source: String,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw artifact content plus the file name it was read from
#[derive(Debug, Clone)]
pub struct ArtifactBytes {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A resolved version with its decoded artifact
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub version: ModelVersion,
    pub artifact: ModelArtifact,
}

#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    /// Resolve a URI to a concrete version
    async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion>;

    /// Download the artifact of a resolved version
    async fn fetch(&self, version: &ModelVersion) -> Result<ArtifactBytes>;

    /// Resolve, fetch and decode in one step
    async fn load(&self, uri: &ModelUri) -> Result<LoadedModel> {
        let version = self.resolve(uri).await?;
        tracing::debug!(
            "Resolved {} to version {} ({})",
            uri,
            version.version,
            version.source
        );
        let artifact = self.fetch(&version).await?;
        let artifact = loader::decode_artifact(&artifact.file_name, &artifact.bytes)?;
        Ok(LoadedModel { version, artifact })
    }
}

/// Pick a backend from the configured tracking URI
pub fn from_config(config: &RegistryConfig) -> anyhow::Result<Arc<dyn ModelRegistry>> {
    let uri = config.tracking_uri.trim();
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(Arc::new(MlflowRegistry::new(uri, config.timeout())?))
    } else {
        let root = uri.strip_prefix("file://").unwrap_or(uri);
        Ok(Arc::new(LocalRegistry::new(root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alias_uri() {
        let uri: ModelUri = "models:/gboost_regressor@champion".parse().unwrap();
        assert_eq!(uri, ModelUri::alias("gboost_regressor", "champion"));
        assert_eq!(uri.to_string(), "models:/gboost_regressor@champion");
    }

    #[test]
    fn test_parse_version_uri() {
        let uri: ModelUri = "models:/gboost_regressor/3".parse().unwrap();
        assert_eq!(uri.reference, ModelReference::Version(3));
        assert_eq!(uri.to_string(), "models:/gboost_regressor/3");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "gboost_regressor@champion",
            "models:/gboost_regressor",
            "models:/@champion",
            "models:/m@",
            "models:/m/latest",
            "models:/a/b@c",
        ] {
            assert!(bad.parse::<ModelUri>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_from_config_picks_backend() {
        let mut config = RegistryConfig::default();
        assert!(from_config(&config).unwrap().describe().starts_with("mlflow"));

        config.tracking_uri = "file:///var/lib/models".to_string();
        assert_eq!(
            from_config(&config).unwrap().describe(),
            "local registry at /var/lib/models"
        );
    }
}

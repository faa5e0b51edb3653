//! Filesystem registry
//!
//! Layout under the root:
//!
//! ```text
//! <root>/<name>/registry.yaml        aliases: {champion: 3}
//! <root>/<name>/<version>/model.json
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ArtifactBytes, ModelReference, ModelRegistry, ModelUri, ModelVersion};
use crate::error::{Result, ServeError};
use crate::loader::find_artifact_file;
use crate::model::ModelArtifact;

const INDEX_FILE: &str = "registry.yaml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryIndex {
    #[serde(default)]
    aliases: BTreeMap<String, u64>,
}

/// Registry stored as a directory tree
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn model_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    async fn read_index(&self, name: &str) -> Result<RegistryIndex> {
        let path = self.model_dir(name).join(INDEX_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServeError::RegistryUnavailable(format!(
                    "model '{}' is not registered under {}",
                    name,
                    self.root.display()
                )))
            }
            Err(e) => {
                return Err(ServeError::RegistryUnavailable(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_yaml::from_str(&text).map_err(|e| {
            ServeError::RegistryUnavailable(format!("corrupt index {}: {}", path.display(), e))
        })
    }

    /// Version numbers present on disk, ascending
    async fn versions(&self, name: &str) -> std::io::Result<Vec<u64>> {
        let dir = self.model_dir(name);
        let mut versions = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(v) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Store an artifact as the next version of `name`
    pub async fn publish(&self, name: &str, artifact: &ModelArtifact) -> anyhow::Result<u64> {
        artifact.validate()?;
        let version = self.versions(name).await?.last().copied().unwrap_or(0) + 1;
        let dir = self.model_dir(name).join(version.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let json = serde_json::to_vec_pretty(artifact)?;
        tokio::fs::write(dir.join("model.json"), json).await?;

        // Make sure an index exists so alias lookups report a missing alias
        // rather than an unregistered model
        let index_path = self.model_dir(name).join(INDEX_FILE);
        if tokio::fs::metadata(&index_path).await.is_err() {
            tokio::fs::write(&index_path, serde_yaml::to_string(&RegistryIndex::default())?).await?;
        }

        tracing::info!("Published {} version {} under {}", name, version, self.root.display());
        Ok(version)
    }

    /// Point `alias` at an existing version
    pub async fn set_alias(&self, name: &str, alias: &str, version: u64) -> anyhow::Result<()> {
        if !self.versions(name).await?.contains(&version) {
            anyhow::bail!("model '{}' has no version {}", name, version);
        }
        let mut index = match self.read_index(name).await {
            Ok(index) => index,
            Err(ServeError::RegistryUnavailable(_)) => RegistryIndex::default(),
            Err(e) => return Err(e.into()),
        };
        index.aliases.insert(alias.to_string(), version);

        let path = self.model_dir(name).join(INDEX_FILE);
        tokio::fs::write(&path, serde_yaml::to_string(&index)?)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ModelRegistry for LocalRegistry {
    fn describe(&self) -> String {
        format!("local registry at {}", self.root.display())
    }

    async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion> {
        let version = match &uri.reference {
            ModelReference::Version(v) => *v,
            ModelReference::Alias(alias) => {
                let index = self.read_index(&uri.name).await?;
                *index.aliases.get(alias).ok_or_else(|| {
                    ServeError::RegistryUnavailable(format!(
                        "alias '{}' not found for model '{}'",
                        alias, uri.name
                    ))
                })?
            }
        };

        let dir = self.model_dir(&uri.name).join(version.to_string());
        let metadata = tokio::fs::metadata(&dir).await.map_err(|_| {
            ServeError::RegistryUnavailable(format!(
                "version {} of model '{}' not found",
                version, uri.name
            ))
        })?;

        Ok(ModelVersion {
            name: uri.name.clone(),
            version: version.to_string(),
            source: dir.to_string_lossy().into_owned(),
            run_id: None,
            created_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    async fn fetch(&self, version: &ModelVersion) -> Result<ArtifactBytes> {
        // Directory scans and globbing block, keep them off the runtime threads
        let source = version.source.clone();
        let file = tokio::task::spawn_blocking(move || find_artifact_file(&source))
            .await
            .map_err(|e| {
                ServeError::ArtifactLoadFailure(format!(
                    "artifact lookup under {} failed: {}",
                    version.source, e
                ))
            })?
            .ok_or_else(|| {
                ServeError::ArtifactLoadFailure(format!("no model artifact under {}", version.source))
            })?;
        let bytes = tokio::fs::read(&file).await.map_err(|e| {
            ServeError::ArtifactLoadFailure(format!("failed to read {}: {}", file.display(), e))
        })?;
        Ok(ArtifactBytes {
            file_name: file.to_string_lossy().into_owned(),
            bytes,
        })
    }
}

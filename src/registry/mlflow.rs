//! MLflow tracking server client

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ArtifactBytes, ModelReference, ModelRegistry, ModelUri, ModelVersion};
use crate::error::{Result, ServeError};
use crate::loader::ARTIFACT_FILE_NAMES;

const API: &str = "api/2.0/mlflow";
const ARTIFACT_PROXY: &str = "api/2.0/mlflow-artifacts/artifacts";

/// Registry backed by the MLflow model registry REST API
pub struct MlflowRegistry {
    base: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ModelVersionResponse {
    model_version: RawModelVersion,
}

#[derive(Debug, Deserialize)]
struct RawModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    run_id: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    creation_timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DownloadUriResponse {
    artifact_uri: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Where one artifact file can be read from
#[derive(Debug, PartialEq)]
enum ArtifactLocation {
    Http(String),
    File(PathBuf),
}

impl MlflowRegistry {
    pub fn new(tracking_uri: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base: tracking_uri.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}/{}", self.base, API, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ServeError::RegistryUnavailable(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&body)
                .ok()
                .and_then(|e| match (e.error_code, e.message) {
                    (Some(code), Some(msg)) => Some(format!("{}: {}", code, msg)),
                    (None, Some(msg)) => Some(msg),
                    (Some(code), None) => Some(code),
                    (None, None) => None,
                })
                .unwrap_or(body);
            return Err(ServeError::RegistryUnavailable(format!(
                "GET {} returned {}: {}",
                endpoint, status, detail
            )));
        }

        response.json::<T>().await.map_err(|e| {
            ServeError::RegistryUnavailable(format!("unexpected response from {}: {}", endpoint, e))
        })
    }

    fn artifact_location(&self, artifact_uri: &str, file_name: &str) -> Result<ArtifactLocation> {
        let root = artifact_uri.trim_end_matches('/');
        if let Some(path) = root.strip_prefix("mlflow-artifacts:") {
            let path = path.trim_start_matches('/');
            return Ok(ArtifactLocation::Http(format!(
                "{}/{}/{}/{}",
                self.base, ARTIFACT_PROXY, path, file_name
            )));
        }
        if root.starts_with("http://") || root.starts_with("https://") {
            return Ok(ArtifactLocation::Http(format!("{}/{}", root, file_name)));
        }
        if let Some(path) = root.strip_prefix("file://") {
            return Ok(ArtifactLocation::File(PathBuf::from(path).join(file_name)));
        }
        if root.contains("://") {
            return Err(ServeError::RegistryUnavailable(format!(
                "unsupported artifact location '{}'",
                artifact_uri
            )));
        }
        Ok(ArtifactLocation::File(PathBuf::from(root).join(file_name)))
    }

    /// Read one artifact file; `None` when it does not exist at that location
    async fn read_location(&self, location: &ArtifactLocation) -> Result<Option<Vec<u8>>> {
        match location {
            ArtifactLocation::Http(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ServeError::RegistryUnavailable(format!("GET {}: {}", url, e)))?;
                match response.status() {
                    StatusCode::NOT_FOUND => Ok(None),
                    status if status.is_success() => {
                        let bytes = response.bytes().await.map_err(|e| {
                            ServeError::RegistryUnavailable(format!("GET {}: {}", url, e))
                        })?;
                        Ok(Some(bytes.to_vec()))
                    }
                    status => Err(ServeError::RegistryUnavailable(format!(
                        "GET {} returned {}",
                        url, status
                    ))),
                }
            }
            ArtifactLocation::File(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ServeError::ArtifactLoadFailure(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))),
            },
        }
    }
}

/// Prefix a registry error's message, keeping its kind
fn with_context(err: ServeError, context: String) -> ServeError {
    match err {
        ServeError::RegistryUnavailable(msg) => {
            ServeError::RegistryUnavailable(format!("{}: {}", context, msg))
        }
        other => other,
    }
}

impl From<RawModelVersion> for ModelVersion {
    fn from(raw: RawModelVersion) -> Self {
        let created_at: Option<DateTime<Utc>> = raw
            .creation_timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        ModelVersion {
            name: raw.name,
            version: raw.version,
            source: raw.source.unwrap_or_default(),
            run_id: raw.run_id.filter(|r| !r.is_empty()),
            created_at,
        }
    }
}

#[async_trait]
impl ModelRegistry for MlflowRegistry {
    fn describe(&self) -> String {
        format!("mlflow at {}", self.base)
    }

    async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion> {
        let response: ModelVersionResponse = match &uri.reference {
            ModelReference::Alias(alias) => self
                .get_json(
                    "registered-models/alias",
                    &[("name", uri.name.as_str()), ("alias", alias.as_str())],
                )
                .await
                .map_err(|e| {
                    with_context(e, format!("cannot resolve alias '{}' of model '{}'", alias, uri.name))
                })?,
            ModelReference::Version(version) => {
                let version = version.to_string();
                self.get_json(
                    "model-versions/get",
                    &[("name", uri.name.as_str()), ("version", version.as_str())],
                )
                .await
                .map_err(|e| {
                    with_context(e, format!("cannot resolve version {} of model '{}'", version, uri.name))
                })?
            }
        };
        Ok(response.model_version.into())
    }

    async fn fetch(&self, version: &ModelVersion) -> Result<ArtifactBytes> {
        let download: DownloadUriResponse = self
            .get_json(
                "model-versions/get-download-uri",
                &[
                    ("name", version.name.as_str()),
                    ("version", version.version.as_str()),
                ],
            )
            .await?;

        for file_name in ARTIFACT_FILE_NAMES {
            let location = self.artifact_location(&download.artifact_uri, file_name)?;
            tracing::debug!("Looking for artifact at {:?}", location);
            if let Some(bytes) = self.read_location(&location).await? {
                return Ok(ArtifactBytes {
                    file_name: file_name.to_string(),
                    bytes,
                });
            }
        }

        Err(ServeError::ArtifactLoadFailure(format!(
            "no model artifact ({}) under {}",
            ARTIFACT_FILE_NAMES.join(", "),
            download.artifact_uri
        )))
    }
}

//! Model artifact loading
//!
//! Artifacts are JSON or YAML documents; the encoding is detected from the
//! file name or, failing that, from the content. Every decoded artifact is
//! validated before it is handed to the engine.

mod detect;

pub use detect::{find_artifact_file, ArtifactFormat, ARTIFACT_FILE_NAMES};

use std::path::Path;

use crate::error::{Result, ServeError};
use crate::model::ModelArtifact;

/// Decode and validate an artifact from raw bytes
pub fn decode_artifact(file_name: &str, bytes: &[u8]) -> Result<ModelArtifact> {
    let format = ArtifactFormat::detect(file_name, bytes);
    let artifact: ModelArtifact = match format {
        ArtifactFormat::Json => serde_json::from_slice(bytes)
            .map_err(|e| ServeError::ArtifactLoadFailure(format!("{}: {}", file_name, e)))?,
        ArtifactFormat::Yaml => serde_yaml::from_slice(bytes)
            .map_err(|e| ServeError::ArtifactLoadFailure(format!("{}: {}", file_name, e)))?,
    };
    artifact.validate()?;
    Ok(artifact)
}

/// Load an artifact from a file or artifact directory on disk
pub async fn load_artifact<P: AsRef<Path>>(path: P) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let file = find_artifact_file(path).ok_or_else(|| {
        ServeError::ArtifactLoadFailure(format!("no model artifact found at {}", path.display()))
    })?;

    let bytes = tokio::fs::read(&file).await.map_err(|e| {
        ServeError::ArtifactLoadFailure(format!("failed to read {}: {}", file.display(), e))
    })?;
    decode_artifact(&file.to_string_lossy(), &bytes)
}

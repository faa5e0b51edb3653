//! Artifact encoding and file detection

use std::path::{Path, PathBuf};

/// File names tried, in order, inside an artifact directory
pub const ARTIFACT_FILE_NAMES: [&str; 3] = ["model.json", "model.yaml", "model.yml"];

/// Detected artifact encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Yaml,
}

impl ArtifactFormat {
    /// Pick the encoding from the file name, falling back to sniffing the content
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "json" => ArtifactFormat::Json,
            "yaml" | "yml" => ArtifactFormat::Yaml,
            _ => {
                // JSON documents start with an object; YAML is the superset fallback
                let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
                if first == Some(&b'{') {
                    ArtifactFormat::Json
                } else {
                    ArtifactFormat::Yaml
                }
            }
        }
    }
}

/// Locate an artifact file: the path itself if it is a file, otherwise the
/// first known artifact name inside the directory, then any `*.json`.
pub fn find_artifact_file<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = path.as_ref();
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if !path.is_dir() {
        return None;
    }

    for name in &ARTIFACT_FILE_NAMES {
        let candidate = path.join(name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let pattern = path.join("*.json");
    glob::glob(pattern.to_str()?)
        .ok()?
        .filter_map(|r| r.ok())
        .next()
}

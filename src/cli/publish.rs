//! Local registry publish command

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::config::AppConfig;
use crate::loader;
use crate::registry::LocalRegistry;

/// Store an artifact as the next version of `name`, optionally aliasing it
pub async fn publish(
    config: AppConfig,
    artifact: PathBuf,
    name: String,
    alias: Option<String>,
) -> Result<()> {
    let root = config.registry.tracking_uri.trim();
    if root.starts_with("http://") || root.starts_with("https://") {
        bail!(
            "publish needs a local registry directory as registry.tracking_uri, got {}",
            root
        );
    }
    let registry = LocalRegistry::new(root.strip_prefix("file://").unwrap_or(root));

    let model = loader::load_artifact(&artifact).await?;
    let version = registry.publish(&name, &model).await?;
    println!("Published {} version {}", name, version);

    if let Some(alias) = alias {
        registry.set_alias(&name, &alias, version).await?;
        println!("models:/{}@{} -> {}", name, alias, version);
    }

    Ok(())
}

//! Model info command

use anyhow::Result;

use crate::config::AppConfig;
use crate::model::Estimator;
use crate::registry::{self, ModelUri};

/// Resolve a model URI and print what it points at
pub async fn info(config: AppConfig, model_uri: Option<String>) -> Result<()> {
    let config = super::with_model_uri(config, model_uri)?;
    let uri: ModelUri = config.registry.model_uri.parse()?;
    let registry = registry::from_config(&config.registry)?;

    let loaded = registry.load(&uri).await?;
    let version = &loaded.version;
    let artifact = &loaded.artifact;

    println!("Model: {}\n", uri);
    println!("Registry: {}", registry.describe());
    println!("Version: {}", version.version);
    println!("Source: {}", version.source);
    if let Some(run_id) = &version.run_id {
        println!("Run: {}", run_id);
    }
    if let Some(created) = version.created_at {
        println!("Created: {}", created.to_rfc3339());
    }

    println!("\nArtifact:");
    println!("  Name: {}", artifact.name);
    if let Some(description) = &artifact.description {
        println!("  Description: {}", description);
    }
    println!("  Estimator: {}", artifact.estimator.kind());
    if let Estimator::GradientBoosting {
        trees,
        learning_rate,
        ..
    } = &artifact.estimator
    {
        println!("  Trees: {} (learning rate {})", trees.len(), learning_rate);
    }
    println!("  Features ({}):", artifact.features.len());
    for name in &artifact.features {
        println!("    {}", name);
    }
    match &artifact.preprocessing {
        Some(pre) => println!(
            "  Preprocessing: {} numeric, {} categorical columns",
            pre.state.scaler.columns.len(),
            pre.state.encoder.columns.len()
        ),
        None => println!("  Preprocessing: none (request fields are used as-is)"),
    }

    Ok(())
}

//! One-shot prediction command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::engine::PredictionService;
use crate::registry;

/// Score a JSON file through the same path as `POST /predict`
pub async fn predict(config: AppConfig, input: PathBuf, model_uri: Option<String>) -> Result<()> {
    let config = super::with_model_uri(config, model_uri)?;

    let content = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let body: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let service = PredictionService::new(&config, registry::from_config(&config.registry)?)?;
    let response = service.predict_json(&body).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

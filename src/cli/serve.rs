//! HTTP server command

use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::engine::PredictionService;
use crate::registry;
use crate::server::{self, AppState};

/// Start the prediction server
pub async fn serve(
    config: AppConfig,
    port: Option<u16>,
    host: Option<String>,
    model_uri: Option<String>,
) -> Result<()> {
    let mut config = super::with_model_uri(config, model_uri)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    let registry = registry::from_config(&config.registry)?;
    tracing::info!(
        "Serving {} from {}",
        config.registry.model_uri,
        registry.describe()
    );
    if config.cache.ttl_secs == 0 {
        tracing::info!("Model cache disabled; every request resolves the model");
    }

    let service = PredictionService::new(&config, registry)?;
    let state = Arc::new(AppState::new(service, config.server.error_mapping));

    server::start(state, config.server).await?;

    Ok(())
}

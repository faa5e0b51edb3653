//! HTTP server for predictions
//!
//! Exposes `POST /predict` and `GET /health`.

mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use handlers::{AppState, ErrorResponse, HealthResponse};
pub use routes::api_routes;

/// Build the application router with its middleware stack
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Result<Router> {
    let mut app = Router::new()
        .merge(api_routes())
        .layer(DefaultBodyLimit::max(config.max_body_size));

    if config.cors_enabled {
        let origins = if config.cors_origins.is_empty() {
            AllowOrigin::from(Any)
        } else {
            let origins = config
                .cors_origins
                .iter()
                .map(|o| {
                    HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{}'", o))
                })
                .collect::<Result<Vec<_>>>()?;
            AllowOrigin::list(origins)
        };
        let cors = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    if config.request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    Ok(app.with_state(state))
}

/// Start the HTTP prediction server
pub async fn start(state: Arc<AppState>, config: ServerConfig) -> Result<()> {
    let app = router(state, &config)?;

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health  - Health check");
    tracing::info!("  POST /predict - Batch prediction");

    axum::serve(listener, app).await?;

    Ok(())
}

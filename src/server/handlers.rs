//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use crate::config::ErrorMapping;
use crate::engine::PredictionService;
use crate::error::ServeError;

/// Shared application state
pub struct AppState {
    pub service: PredictionService,
    pub error_mapping: ErrorMapping,
}

impl AppState {
    pub fn new(service: PredictionService, error_mapping: ErrorMapping) -> Self {
        Self {
            service,
            error_mapping,
        }
    }

    fn error_response(&self, err: ServeError) -> Response {
        let status = StatusCode::from_u16(self.error_mapping.status(err.kind()))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Prediction failed: {}", err);
        } else {
            tracing::warn!("Rejected request: {}", err);
        }
        (
            status,
            Json(ErrorResponse {
                detail: err.to_string(),
            }),
        )
            .into_response()
    }
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model_uri: state.service.model_uri().to_string(),
        }),
    )
}

/// Batch prediction endpoint
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id);

    async move {
        tracing::info!("Received request. Starting prediction.");
        let body = match payload {
            Ok(Json(body)) => body,
            Err(rejection) => {
                return state.error_response(ServeError::InvalidInput(rejection.body_text()))
            }
        };

        match state.service.predict_json(&body).await {
            Ok(response) => {
                tracing::info!(
                    "Completed {} predictions with {}",
                    response.len(),
                    state.service.model_uri()
                );
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => state.error_response(e),
        }
    }
    .instrument(span)
    .await
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

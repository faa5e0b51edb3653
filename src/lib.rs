//! hrserve - employee satisfaction prediction service
//!
//! Serves a registered regression model over HTTP and provides the feature
//! engineering used to train it.
//!
//! # Architecture
//!
//! - **features**: tables, feature schema, standard scaling and one-hot encoding
//! - **model**: serializable estimators and model artifacts
//! - **loader**: artifact decoding (JSON / YAML)
//! - **registry**: `models:/` URI resolution against MLflow or a local directory
//! - **engine**: predictor, model cache with retry, prediction service
//! - **server**: `POST /predict` and `GET /health`
//!
//! # Example
//!
//! ```bash
//! # Start server against an MLflow tracking server
//! HRSERVE_TRACKING_URI=http://tracking_server:5000 hrserve serve --port 8000
//!
//! # Fit feature parameters on training data
//! hrserve fit train.csv --state-out state.json --drop-ignored -o features.csv
//!
//! # Resolve the champion model and describe it
//! hrserve info --model-uri models:/gboost_regressor@champion
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod loader;
pub mod model;
pub mod registry;
pub mod server;

// Re-export key types
pub use config::{AppConfig, ErrorMapping, ServerConfig};
pub use engine::{PredictionResponse, PredictionService};
pub use error::{ErrorKind, ServeError};
pub use registry::{ModelRegistry, ModelUri};

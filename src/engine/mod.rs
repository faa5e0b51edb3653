//! Inference engine
//!
//! This module provides the prediction pipeline:
//! - Predictor: runs inference for one loaded model version
//! - ModelCache: freshness-bounded cache with registry retry
//! - PredictionService: validates requests and scores them

mod cache;
mod predictor;
mod service;

pub use cache::{ModelCache, RetryPolicy};
pub use predictor::Predictor;
pub use service::{PredictionResponse, PredictionService};

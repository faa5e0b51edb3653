//! Prediction service
//!
//! The request path shared by the HTTP handler and the `predict` command:
//! parse records, validate them against the feature schema, load the
//! configured model and score the batch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::engine::{ModelCache, RetryPolicy};
use crate::error::Result;
use crate::features::{drop_ignored, records_from_json, FeatureSchema, Record, Table};
use crate::registry::{ModelRegistry, ModelUri};

/// Row-aligned predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub row_number: Vec<usize>,
    pub predicted_value: Vec<f64>,
}

impl PredictionResponse {
    pub fn new(predicted_value: Vec<f64>) -> Self {
        Self {
            row_number: (0..predicted_value.len()).collect(),
            predicted_value,
        }
    }

    pub fn len(&self) -> usize {
        self.predicted_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicted_value.is_empty()
    }
}

pub struct PredictionService {
    cache: ModelCache,
    model_uri: ModelUri,
    schema: FeatureSchema,
    strict: bool,
}

impl PredictionService {
    pub fn new(config: &AppConfig, registry: Arc<dyn ModelRegistry>) -> anyhow::Result<Self> {
        let model_uri: ModelUri = config
            .registry
            .model_uri
            .parse()
            .context("invalid registry.model_uri")?;
        config.schema.validate().context("invalid feature schema")?;

        let cache = ModelCache::new(registry)
            .with_ttl(Duration::from_secs(config.cache.ttl_secs))
            .with_max_entries(config.cache.max_entries)
            .with_retry(RetryPolicy {
                max_retries: config.registry.max_retries,
                backoff: Duration::from_millis(config.registry.retry_backoff_ms),
            });

        Ok(Self {
            cache,
            model_uri,
            schema: config.schema.clone(),
            strict: config.validation.strict,
        })
    }

    pub fn model_uri(&self) -> &ModelUri {
        &self.model_uri
    }

    /// Score a raw JSON request body
    pub async fn predict_json(&self, body: &Value) -> Result<PredictionResponse> {
        let records = records_from_json(body)?;
        self.predict_records(&records).await
    }

    /// Score a record batch; output row `i` belongs to record `i`
    pub async fn predict_records(&self, records: &[Record]) -> Result<PredictionResponse> {
        if self.strict {
            for (row, record) in records.iter().enumerate() {
                self.schema.check_record(row, record)?;
            }
        }
        if records.is_empty() {
            return Ok(PredictionResponse::new(Vec::new()));
        }

        let mut table = Table::from_records(records);
        if self.strict {
            table = drop_ignored(&table, &self.schema);
        }

        let predictor = self.cache.get_predictor(&self.model_uri).await?;
        let predictions = predictor.predict(&table)?;
        Ok(PredictionResponse::new(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::ServeError;
    use crate::features::{example_record, Scalar};
    use crate::registry::{ArtifactBytes, ModelVersion};

    /// Registry that must never be reached
    struct Unreachable;

    #[async_trait]
    impl ModelRegistry for Unreachable {
        fn describe(&self) -> String {
            "unreachable".into()
        }

        async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion> {
            Err(ServeError::RegistryUnavailable(format!("cannot resolve {}", uri)))
        }

        async fn fetch(&self, _version: &ModelVersion) -> Result<ArtifactBytes> {
            unreachable!()
        }
    }

    fn service(strict: bool) -> PredictionService {
        let mut config = AppConfig::default();
        config.validation.strict = strict;
        PredictionService::new(&config, Arc::new(Unreachable)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_batch_skips_registry() {
        let response = service(true).predict_json(&json!([])).await.unwrap();
        assert!(response.is_empty());
        assert!(response.row_number.is_empty());
    }

    #[tokio::test]
    async fn test_strict_rejects_target_column() {
        let schema = FeatureSchema::default();
        let record = example_record(&schema, 1.0, "HR")
            .with("Employee_Satisfaction_Score", Scalar::Number(4.0));
        let err = service(true).predict_records(&[record]).await.unwrap_err();
        assert!(matches!(err, ServeError::InvalidInput(_)));
        assert!(err.to_string().contains("target column"));
    }

    #[tokio::test]
    async fn test_lenient_passes_records_to_registry() {
        let record = Record::new().with("anything", Scalar::Number(1.0));
        let err = service(false).predict_records(&[record]).await.unwrap_err();
        assert!(matches!(err, ServeError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let err = service(true)
            .predict_json(&json!({"Age": 30}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[test]
    fn test_bad_model_uri_rejected_at_construction() {
        let mut config = AppConfig::default();
        config.registry.model_uri = "gboost_regressor".into();
        assert!(PredictionService::new(&config, Arc::new(Unreachable)).is_err());
    }
}

//! HTTP tests for `/predict` and `/health` against in-memory registries

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hrserve::config::{AppConfig, ErrorMapping};
use hrserve::engine::PredictionService;
use hrserve::error::{Result, ServeError};
use hrserve::features::{example_record, FeatureSchema, FeatureState, Table};
use hrserve::model::{Estimator, ModelArtifact, Preprocessing};
use hrserve::registry::{ArtifactBytes, ModelRegistry, ModelUri, ModelVersion};
use hrserve::server::{self, AppState};

/// Serves one artifact, failing the first `failures` resolutions
struct StubRegistry {
    artifact: ModelArtifact,
    failures: usize,
    resolves: AtomicUsize,
}

impl StubRegistry {
    fn new(artifact: ModelArtifact) -> Arc<Self> {
        Self::flaky(artifact, 0)
    }

    fn flaky(artifact: ModelArtifact, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            artifact,
            failures,
            resolves: AtomicUsize::new(0),
        })
    }

    fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelRegistry for StubRegistry {
    fn describe(&self) -> String {
        "stub".to_string()
    }

    async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion> {
        let n = self.resolves.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(ServeError::RegistryUnavailable(format!(
                "cannot resolve {}: connection refused",
                uri
            )));
        }
        Ok(ModelVersion {
            name: uri.name.clone(),
            version: "1".to_string(),
            source: "memory".to_string(),
            run_id: None,
            created_at: None,
        })
    }

    async fn fetch(&self, _version: &ModelVersion) -> Result<ArtifactBytes> {
        Ok(ArtifactBytes {
            file_name: "model.json".to_string(),
            bytes: serde_json::to_vec(&self.artifact).unwrap(),
        })
    }
}

/// Registry that is never reachable
struct DownRegistry;

#[async_trait]
impl ModelRegistry for DownRegistry {
    fn describe(&self) -> String {
        "down".to_string()
    }

    async fn resolve(&self, uri: &ModelUri) -> Result<ModelVersion> {
        Err(ServeError::RegistryUnavailable(format!(
            "alias '{}' could not be resolved",
            uri
        )))
    }

    async fn fetch(&self, _version: &ModelVersion) -> Result<ArtifactBytes> {
        Err(ServeError::RegistryUnavailable("down".to_string()))
    }
}

/// `1 + 0.1 * Age + 2 * Team_Size` on raw request fields
fn raw_artifact() -> ModelArtifact {
    ModelArtifact {
        name: "gboost_regressor".to_string(),
        description: None,
        features: vec!["Age".to_string(), "Team_Size".to_string()],
        estimator: Estimator::Linear {
            intercept: 1.0,
            coefficients: vec![0.1, 2.0],
        },
        preprocessing: None,
    }
}

fn app(config: &AppConfig, registry: Arc<dyn ModelRegistry>) -> Router {
    let service = PredictionService::new(config, registry).unwrap();
    let state = Arc::new(AppState::new(service, config.server.error_mapping));
    server::router(state, &config.server).unwrap()
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.retry_backoff_ms = 1;
    config
}

async fn post_predict(app: Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn records(ages: &[f64]) -> Value {
    let schema = FeatureSchema::default();
    let rows: Vec<Value> = ages
        .iter()
        .map(|age| {
            let mut row = serde_json::Map::new();
            for name in &schema.numeric {
                row.insert(name.clone(), json!(1.0));
            }
            for name in &schema.categorical {
                row.insert(name.clone(), json!("HR"));
            }
            row.insert("Age".to_string(), json!(age));
            row.insert("Employee_ID".to_string(), json!(42));
            Value::Object(row)
        })
        .collect();
    Value::Array(rows)
}

#[tokio::test]
async fn test_predictions_align_with_rows() {
    let app = app(&test_config(), StubRegistry::new(raw_artifact()));
    let (status, body) = post_predict(app, records(&[20.0, 30.0, 40.0]).to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_number"], json!([0, 1, 2]));
    let values: Vec<f64> = serde_json::from_value(body["predicted_value"].clone()).unwrap();
    assert_eq!(values.len(), 3);
    for (value, expected) in values.iter().zip([5.0, 6.0, 7.0]) {
        assert!((value - expected).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let registry = StubRegistry::new(raw_artifact());
    let app = app(&test_config(), registry.clone());
    let (status, body) = post_predict(app, "[]".to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"row_number": [], "predicted_value": []}));
    assert_eq!(registry.resolves(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_typed_mapping() {
    let mut config = test_config();
    config.server.error_mapping = ErrorMapping::Typed;
    let registry = StubRegistry::new(raw_artifact());

    for body in [r#"{"Age": 30}"#, "[1, 2]", "[{\"Age\": [1]}]", "not json"] {
        let (status, response) = post_predict(app(&config, registry.clone()), body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(!response["detail"].as_str().unwrap().is_empty());
    }

    // Still serving after the failures
    let (status, _) = post_predict(app(&config, registry), records(&[30.0]).to_string()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_default_config_maps_every_failure_to_500() {
    let config = test_config();
    assert_eq!(config.server.error_mapping, ErrorMapping::Uniform);
    assert!(!config.validation.strict);
    let registry = StubRegistry::new(raw_artifact());

    for (body, detail) in [
        (r#"{"Age": 30}"#, "expected a JSON array"),
        ("[1, 2]", "row 0 must be an object"),
    ] {
        let (status, response) = post_predict(app(&config, registry.clone()), body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", body);
        assert!(response["detail"].as_str().unwrap().contains(detail), "{}", response);
    }
    assert_eq!(registry.resolves(), 0);

    // Unknown fields are not screened out; the model reports what it lacks
    let (status, response) =
        post_predict(app(&config, registry.clone()), r#"[{"Unknown": 1}]"#.to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response["detail"]
        .as_str()
        .unwrap()
        .contains("feature 'Age' is missing"));
    assert_eq!(registry.resolves(), 1);
}

#[tokio::test]
async fn test_strict_validation_names_row_and_field() {
    let mut rows = records(&[30.0, 31.0]);
    rows[1]["Employee_Satisfaction_Score"] = json!(3.5);
    let mut config = test_config();
    config.validation.strict = true;
    config.server.error_mapping = ErrorMapping::Typed;
    let app = app(&config, StubRegistry::new(raw_artifact()));

    let (status, body) = post_predict(app, rows.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("row 1"));
    assert!(detail.contains("Employee_Satisfaction_Score"));
}

#[tokio::test]
async fn test_registry_failure_is_500_naming_alias() {
    let mut config = test_config();
    config.registry.max_retries = 0;
    let app = app(&config, Arc::new(DownRegistry));

    let (status, body) = post_predict(app, records(&[30.0]).to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("model registry unavailable"));
    assert!(detail.contains("gboost_regressor@champion"));
}

#[tokio::test]
async fn test_registry_recovers_within_retry_budget() {
    let registry = StubRegistry::flaky(raw_artifact(), 2);
    let app = app(&test_config(), registry.clone());

    let (status, body) = post_predict(app, records(&[30.0]).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["row_number"], json!([0]));
    assert_eq!(registry.resolves(), 3);
}

#[tokio::test]
async fn test_cache_ttl_controls_reloads() {
    let registry = StubRegistry::new(raw_artifact());
    let first_app = app(&test_config(), registry.clone());
    for _ in 0..2 {
        let (status, _) = post_predict(first_app.clone(), records(&[30.0]).to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(registry.resolves(), 2);

    let mut config = test_config();
    config.cache.ttl_secs = 300;
    let registry = StubRegistry::new(raw_artifact());
    let app = app(&config, registry.clone());
    for _ in 0..3 {
        let (status, _) = post_predict(app.clone(), records(&[30.0]).to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(registry.resolves(), 1);
}

#[tokio::test]
async fn test_embedded_preprocessing() {
    let schema = FeatureSchema::default();
    let training = Table::from_records(&[
        example_record(&schema, 1.0, "HR"),
        example_record(&schema, 3.0, "IT"),
    ]);
    let state = FeatureState::fit(&training, &schema).unwrap();
    let features = state.feature_names();
    let coefficients = features
        .iter()
        .map(|name| if name == "Department_IT" { 10.0 } else { 0.0 })
        .collect();

    let artifact = ModelArtifact {
        name: "gboost_regressor".to_string(),
        description: None,
        features,
        estimator: Estimator::Linear {
            intercept: 0.0,
            coefficients,
        },
        preprocessing: Some(Preprocessing { schema, state }),
    };
    let app = app(&test_config(), StubRegistry::new(artifact));

    let mut rows = records(&[1.0, 1.0]);
    rows[1]["Department"] = json!("IT");
    let (status, body) = post_predict(app.clone(), rows.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_value"], json!([0.0, 10.0]));

    rows[0]["Department"] = json!("Legal");
    let (status, body) = post_predict(app, rows.to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("'Legal'"));
}

#[tokio::test]
async fn test_health() {
    let app = app(&test_config(), Arc::new(DownRegistry));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_uri"], "models:/gboost_regressor@champion");
}

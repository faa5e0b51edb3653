//! Predictor
//!
//! Runs inference for one loaded model version.

use crate::error::{Result, ServeError};
use crate::features::Table;
use crate::model::ModelArtifact;
use crate::registry::{LoadedModel, ModelVersion};

/// A loaded model ready to score tables
#[derive(Debug)]
pub struct Predictor {
    /// The registry version this predictor was built from
    version: ModelVersion,
    /// The decoded artifact
    artifact: ModelArtifact,
}

impl Predictor {
    /// Create a new predictor
    pub fn new(loaded: LoadedModel) -> Self {
        let LoadedModel { version, artifact } = loaded;
        if artifact.preprocessing.is_none() {
            tracing::warn!(
                "Model '{}' version {} declares no preprocessing; request fields are fed to it untransformed",
                artifact.name,
                version.version
            );
        }
        tracing::info!(
            "Loaded model '{}' version {} ({} estimator, {} features)",
            version.name,
            version.version,
            artifact.estimator.kind(),
            artifact.features.len()
        );

        Self { version, artifact }
    }

    pub fn version(&self) -> &ModelVersion {
        &self.version
    }

    /// Predict one value per row, aligned with the table's row order
    pub fn predict(&self, table: &Table) -> Result<Vec<f64>> {
        tracing::debug!(
            "Scoring {} rows x {} columns with version {}",
            table.num_rows(),
            table.num_columns(),
            self.version.version
        );

        let predictions = self.artifact.predict(table)?;
        if predictions.len() != table.num_rows() {
            return Err(ServeError::inference(format!(
                "model returned {} predictions for {} rows",
                predictions.len(),
                table.num_rows()
            )));
        }
        Ok(predictions)
    }
}

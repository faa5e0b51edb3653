//! Serialized model artifact

use serde::{Deserialize, Serialize};

use super::estimator::Estimator;
use crate::error::{Result, ServeError};
use crate::features::{transform, FeatureSchema, FeatureState, Scalar, Table};

/// Feature transform an artifact declares it was trained behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessing {
    pub schema: FeatureSchema,
    pub state: FeatureState,
}

/// A deserialized model: input feature names, estimator, optional preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Input feature names in the order the estimator indexes them
    pub features: Vec<String>,

    pub estimator: Estimator,

    #[serde(default)]
    pub preprocessing: Option<Preprocessing>,
}

impl ModelArtifact {
    /// Check internal consistency after decoding
    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(ServeError::ArtifactLoadFailure(format!(
                "model '{}' declares no input features",
                self.name
            )));
        }
        self.estimator.validate(self.features.len())?;
        if let Some(pre) = &self.preprocessing {
            pre.schema
                .validate()
                .and_then(|_| pre.state.validate())
                .map_err(|e| {
                    ServeError::ArtifactLoadFailure(format!(
                        "model '{}' has unusable preprocessing: {}",
                        self.name, e
                    ))
                })?;
        }
        Ok(())
    }

    /// Predict one value per table row, in row order
    pub fn predict(&self, table: &Table) -> Result<Vec<f64>> {
        let encoded;
        let input = match &self.preprocessing {
            Some(pre) => {
                encoded = transform(table, &pre.schema, Some(&pre.state), Default::default())?.0;
                &encoded
            }
            None => table,
        };

        let columns = self
            .features
            .iter()
            .map(|name| {
                input.column(name).ok_or_else(|| {
                    ServeError::inference(format!("feature '{}' is missing from the input", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut row = vec![0.0; columns.len()];
        (0..input.num_rows())
            .map(|r| {
                for (slot, column) in row.iter_mut().zip(&columns) {
                    *slot = cell_value(&column.values[r]).ok_or_else(|| {
                        ServeError::inference(format!(
                            "feature '{}' row {} is {}, expected a number",
                            column.name,
                            input.index()[r],
                            column.values[r].type_name()
                        ))
                    })?;
                }
                Ok(self.estimator.predict_row(&row))
            })
            .collect()
    }
}

fn cell_value(value: &Scalar) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Column, Record};

    fn linear(features: &[&str], coefficients: Vec<f64>) -> ModelArtifact {
        ModelArtifact {
            name: "test".into(),
            description: None,
            features: features.iter().map(|s| s.to_string()).collect(),
            estimator: Estimator::Linear {
                intercept: 0.5,
                coefficients,
            },
            preprocessing: None,
        }
    }

    #[test]
    fn test_predict_raw_columns_by_name() {
        let model = linear(&["b", "a"], vec![10.0, 1.0]);
        let table = Table::new(
            vec![0, 1],
            vec![
                Column::numeric("a", [1.0, 2.0]),
                Column::new("b", vec![Scalar::Bool(true), Scalar::Bool(false)]),
            ],
        )
        .unwrap();
        assert_eq!(model.predict(&table).unwrap(), vec![11.5, 2.5]);
    }

    #[test]
    fn test_missing_feature_is_inference_failure() {
        let model = linear(&["a", "z"], vec![1.0, 1.0]);
        let table = Table::new(vec![0], vec![Column::numeric("a", [1.0])]).unwrap();
        let err = model.predict(&table).unwrap_err();
        assert!(matches!(err, ServeError::InferenceFailure(_)));
        assert!(err.to_string().contains("feature 'z' is missing"));
    }

    #[test]
    fn test_text_value_is_inference_failure() {
        let model = linear(&["a"], vec![1.0]);
        let table =
            Table::new(vec![0], vec![Column::new("a", vec![Scalar::Text("x".into())])]).unwrap();
        let err = model.predict(&table).unwrap_err();
        assert!(err.to_string().contains("row 0 is string"));
    }

    #[test]
    fn test_embedded_preprocessing_applied() {
        let schema = FeatureSchema {
            numeric: vec!["Age".into()],
            categorical: vec!["Department".into()],
            target: "Score".into(),
            ignored: vec![],
        };
        let training = Table::from_records(&[
            Record::new()
                .with("Age", Scalar::Number(20.0))
                .with("Department", Scalar::Text("HR".into())),
            Record::new()
                .with("Age", Scalar::Number(40.0))
                .with("Department", Scalar::Text("IT".into())),
        ]);
        let state = FeatureState::fit(&training, &schema).unwrap();

        let mut model = linear(&["Age", "Department_IT"], vec![1.0, 100.0]);
        model.preprocessing = Some(Preprocessing { schema, state });
        model.validate().unwrap();

        let predictions = model.predict(&training).unwrap();
        assert_eq!(predictions, vec![0.5 - 1.0, 0.5 + 1.0 + 100.0]);
    }

    #[test]
    fn test_validate_rejects_empty_features() {
        let model = linear(&[], vec![]);
        assert!(matches!(
            model.validate(),
            Err(ServeError::ArtifactLoadFailure(_))
        ));
    }
}

//! Estimators that can be evaluated over a dense feature row

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServeError};

/// Fitted regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    /// `intercept + coefficients · x`
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// `init + learning_rate * Σ tree(x)`
    GradientBoosting {
        init: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

/// Regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Go to `left` when `x[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Linear { .. } => "linear",
            Estimator::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    /// Check the estimator is consistent with `n_features` inputs
    pub fn validate(&self, n_features: usize) -> Result<()> {
        match self {
            Estimator::Linear { coefficients, .. } => {
                if coefficients.len() != n_features {
                    return Err(ServeError::ArtifactLoadFailure(format!(
                        "linear model has {} coefficients for {} features",
                        coefficients.len(),
                        n_features
                    )));
                }
            }
            Estimator::GradientBoosting { trees, .. } => {
                for (t, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|msg| ServeError::ArtifactLoadFailure(format!("tree {}: {}", t, msg)))?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate one row; `x` must have the validated length
    pub fn predict_row(&self, x: &[f64]) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>(),
            Estimator::GradientBoosting {
                init,
                learning_rate,
                trees,
            } => init + learning_rate * trees.iter().map(|t| t.eval(x)).sum::<f64>(),
        }
    }
}

impl Tree {
    /// Children must point forward so evaluation always reaches a leaf
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but the model has {}",
                        i, feature, n_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

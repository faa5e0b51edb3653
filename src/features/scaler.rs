//! Standardization parameters

use serde::{Deserialize, Serialize};

use super::table::Table;
use crate::error::{Result, ServeError};

/// Per-column standardization fit on a training table.
///
/// Uses the population variance; a column with zero variance keeps
/// `scale = 1.0` so it maps to zero rather than NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub var: Vec<f64>,
    pub scale: Vec<f64>,
    pub n_samples: usize,
}

impl StandardScaler {
    /// Fit on the named columns of `table`
    pub fn fit<S: AsRef<str>>(table: &Table, columns: &[S]) -> Result<Self> {
        if table.num_rows() == 0 {
            return Err(ServeError::invalid("cannot fit a scaler on an empty table"));
        }

        let n = table.num_rows() as f64;
        let mut scaler = Self {
            columns: Vec::with_capacity(columns.len()),
            mean: Vec::with_capacity(columns.len()),
            var: Vec::with_capacity(columns.len()),
            scale: Vec::with_capacity(columns.len()),
            n_samples: table.num_rows(),
        };

        for name in columns {
            let name = name.as_ref();
            let values = numeric_values(table, name)?;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();

            scaler.columns.push(name.to_string());
            scaler.mean.push(mean);
            scaler.var.push(var);
            scaler
                .scale
                .push(if std < 10.0 * f64::EPSILON { 1.0 } else { std });
        }

        Ok(scaler)
    }

    /// Standardize the scaler's columns of `table`, one vector per column
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (mean, scale) = self
                    .mean
                    .get(i)
                    .zip(self.scale.get(i))
                    .map(|(m, s)| (*m, *s))
                    .ok_or_else(|| {
                        ServeError::invalid(format!("scaler has no parameters for column '{}'", name))
                    })?;
                Ok(numeric_values(table, name)?
                    .into_iter()
                    .map(|v| (v - mean) / scale)
                    .collect())
            })
            .collect()
    }

    /// Check the parameter vectors line up, as after deserialization
    pub fn validate(&self) -> Result<()> {
        let n = self.columns.len();
        if self.mean.len() != n || self.var.len() != n || self.scale.len() != n {
            return Err(ServeError::invalid(format!(
                "scaler has {} columns but {} means, {} variances and {} scales",
                n,
                self.mean.len(),
                self.var.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(ServeError::invalid(format!(
                "scaler column '{}' has unusable mean {}",
                self.columns[i], self.mean[i]
            )));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(ServeError::invalid(format!(
                "scaler column '{}' has unusable scale {}",
                self.columns[i], self.scale[i]
            )));
        }
        Ok(())
    }
}

/// Read a column as numbers, failing on missing columns or non-numeric cells
pub(crate) fn numeric_values(table: &Table, name: &str) -> Result<Vec<f64>> {
    let column = table
        .column(name)
        .ok_or_else(|| ServeError::invalid(format!("missing numeric column '{}'", name)))?;

    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            value.as_f64().ok_or_else(|| {
                ServeError::invalid(format!(
                    "column '{}' row {} is {} where a number is required",
                    name,
                    table.index()[row],
                    value.type_name()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::table::{Column, Scalar};

    fn table() -> Table {
        Table::new(
            vec![0, 1, 2, 3],
            vec![
                Column::numeric("a", [1.0, 2.0, 3.0, 4.0]),
                Column::numeric("flat", [5.0, 5.0, 5.0, 5.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_uses_population_variance() {
        let scaler = StandardScaler::fit(&table(), &["a"]).unwrap();
        assert_eq!(scaler.mean, vec![2.5]);
        assert!((scaler.var[0] - 1.25).abs() < 1e-12);
        assert!((scaler.scale[0] - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!(scaler.n_samples, 4);
    }

    #[test]
    fn test_transform_centers_and_scales() {
        let scaler = StandardScaler::fit(&table(), &["a"]).unwrap();
        let out = scaler.transform(&table()).unwrap();
        let mean: f64 = out[0].iter().sum::<f64>() / 4.0;
        let var: f64 = out[0].iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert!((out[0][3] * scaler.scale[0] + scaler.mean[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_column_maps_to_zero() {
        let scaler = StandardScaler::fit(&table(), &["flat"]).unwrap();
        assert_eq!(scaler.scale, vec![1.0]);
        let out = scaler.transform(&table()).unwrap();
        assert!(out[0].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fit_rejects_text_and_empty() {
        let bad = Table::new(
            vec![0],
            vec![Column::new("a", vec![Scalar::Text("x".into())])],
        )
        .unwrap();
        assert!(StandardScaler::fit(&bad, &["a"]).is_err());
        assert!(StandardScaler::fit(&Table::default(), &["a"]).is_err());
    }

    #[test]
    fn test_validate_catches_misaligned_params() {
        let mut scaler = StandardScaler::fit(&table(), &["a"]).unwrap();
        scaler.validate().unwrap();
        scaler.scale.push(1.0);
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_missing_params_error_instead_of_panicking() {
        let mut scaler = StandardScaler::fit(&table(), &["a"]).unwrap();
        scaler.mean.clear();
        assert!(scaler.validate().is_err());
        assert!(scaler.transform(&table()).is_err());

        let mut scaler = StandardScaler::fit(&table(), &["a"]).unwrap();
        scaler.mean[0] = f64::NAN;
        assert!(scaler.validate().unwrap_err().to_string().contains("unusable mean"));
    }
}

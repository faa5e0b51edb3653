//! Feature engineering for training and prediction
//!
//! Two entry points share one encoding path:
//!
//! - [`transform`] prepares model inputs. It fits new parameters when none
//!   are supplied and otherwise applies the supplied ones unchanged. The
//!   target column must not be present.
//! - [`transform_training`] additionally standardizes the target with its
//!   own scaler, for training code.
//!
//! Output columns keep the input's non-categorical columns in input order
//! (numerics replaced by their standardized values), followed by the
//! indicator columns of each categorical column in schema order.

use serde::{Deserialize, Serialize};

use super::onehot::OneHotEncoder;
use super::scaler::StandardScaler;
use super::schema::FeatureSchema;
use super::table::{Column, Scalar, Table};
use crate::error::{Result, ServeError};

/// Parameters pinned at fit time and reused at inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    pub scaler: StandardScaler,
    pub encoder: OneHotEncoder,
}

impl FeatureState {
    /// Fit scaler and encoder on the schema's feature columns
    pub fn fit(table: &Table, schema: &FeatureSchema) -> Result<Self> {
        Ok(Self {
            scaler: StandardScaler::fit(table, &schema.numeric)?,
            encoder: OneHotEncoder::fit(table, &schema.categorical)?,
        })
    }

    /// Names of the columns the encoded table will hold for model input
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.scaler.columns.clone();
        names.extend(self.encoder.indicator_names());
        names
    }

    pub fn validate(&self) -> Result<()> {
        self.scaler.validate()?;
        self.encoder.validate()
    }
}

/// Feature state plus the independently fit target scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub features: FeatureState,
    pub target: StandardScaler,
}

impl TrainingState {
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.target.validate()?;
        if self.target.columns.len() != 1 {
            return Err(ServeError::invalid(format!(
                "target scaler must cover exactly one column, found {}",
                self.target.columns.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// Renumber the output rows `0..N-1`
    pub reset_index: bool,
}

/// Prepare model inputs from raw records.
///
/// With `state == None` parameters are fit on `table` and returned; with a
/// state they are applied without refitting and a copy is returned.
pub fn transform(
    table: &Table,
    schema: &FeatureSchema,
    state: Option<&FeatureState>,
    options: TransformOptions,
) -> Result<(Table, FeatureState)> {
    if table.contains(&schema.target) {
        return Err(ServeError::invalid(format!(
            "target column '{}' must not be used as a feature",
            schema.target
        )));
    }

    let state = match state {
        Some(state) => {
            state.validate()?;
            state.clone()
        }
        None => FeatureState::fit(table, schema)?,
    };
    let encoded = encode(table, schema, &state, options)?;
    Ok((encoded, state))
}

/// Prepare a training table, standardizing the target as well
pub fn transform_training(
    table: &Table,
    schema: &FeatureSchema,
    state: Option<&TrainingState>,
    options: TransformOptions,
) -> Result<(Table, TrainingState)> {
    if !table.contains(&schema.target) {
        return Err(ServeError::invalid(format!(
            "training table has no target column '{}'",
            schema.target
        )));
    }

    let state = match state {
        Some(state) => {
            state.validate()?;
            if state.target.columns[0] != schema.target {
                return Err(ServeError::invalid(format!(
                    "target scaler was fit on '{}', schema target is '{}'",
                    state.target.columns[0], schema.target
                )));
            }
            state.clone()
        }
        None => TrainingState {
            features: FeatureState::fit(table, schema)?,
            target: StandardScaler::fit(table, std::slice::from_ref(&schema.target))?,
        },
    };

    let mut encoded = encode(table, schema, &state.features, options)?;
    let target = state
        .target
        .transform(table)?
        .into_iter()
        .next()
        .unwrap_or_default();
    encoded.set_column(Column::numeric(schema.target.clone(), target))?;

    Ok((encoded, state))
}

/// Remove identifier columns the model never sees
pub fn drop_ignored(table: &Table, schema: &FeatureSchema) -> Table {
    let mut out = table.clone();
    out.drop_columns(&schema.ignored);
    out
}

fn encode(
    table: &Table,
    schema: &FeatureSchema,
    state: &FeatureState,
    options: TransformOptions,
) -> Result<Table> {
    for name in schema.feature_columns() {
        if !table.contains(name) {
            return Err(ServeError::invalid(format!("missing feature column '{}'", name)));
        }
    }

    let scaled = state.scaler.transform(table)?;
    let indicators = state.encoder.encode(table)?;

    let mut columns = Vec::with_capacity(table.num_columns() + indicators.len());
    for column in table.columns() {
        if schema.is_categorical(&column.name) {
            continue;
        }
        match state.scaler.columns.iter().position(|c| *c == column.name) {
            Some(i) => columns.push(Column::new(
                column.name.clone(),
                scaled[i].iter().copied().map(Scalar::Number).collect(),
            )),
            None => columns.push(column.clone()),
        }
    }
    columns.extend(indicators);

    let mut out = table.with_columns(columns)?;
    if options.reset_index {
        out.reset_index();
    }
    Ok(out)
}

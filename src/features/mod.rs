//! Feature engineering
//!
//! Tables built from record batches, the feature schema, and the
//! standardization / one-hot transform shared by training and serving.

pub mod io;
mod onehot;
mod scaler;
mod schema;
mod table;
mod transform;

pub use onehot::{CategoryLevels, OneHotEncoder};
pub use scaler::StandardScaler;
pub use schema::{example_record, FeatureSchema};
pub use table::{records_from_json, Column, Record, Scalar, Table};
pub use transform::{
    drop_ignored, transform, transform_training, FeatureState, TrainingState, TransformOptions,
};

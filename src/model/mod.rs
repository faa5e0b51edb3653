//! Model artifacts.
//!
//! An artifact names its input features, carries a fitted estimator, and may
//! declare the feature transform it was trained behind.

mod artifact;
mod estimator;

pub use artifact::{ModelArtifact, Preprocessing};
pub use estimator::{Estimator, Node, Tree};

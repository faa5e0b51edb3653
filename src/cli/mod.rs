//! CLI commands
//!
//! `serve` runs the HTTP service; the other commands expose the same
//! prediction path and the feature transform from the shell.

mod fit;
mod info;
mod predict;
mod publish;
mod serve;
mod transform;

pub use fit::fit;
pub use info::info;
pub use predict::predict;
pub use publish::publish;
pub use serve::serve;
pub use transform::transform;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// hrserve - employee satisfaction prediction service
#[derive(Parser)]
#[command(name = "hrserve")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(long, short, global = true, env = "HRSERVE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Model to serve, e.g. models:/gboost_regressor@champion
        #[arg(long)]
        model_uri: Option<String>,
    },

    /// Score a JSON file of records and print the response
    Predict {
        /// JSON array of records
        input: PathBuf,

        #[arg(long)]
        model_uri: Option<String>,
    },

    /// Fit feature parameters on a training CSV
    Fit {
        /// Training data, target column included
        input: PathBuf,

        /// Where to write the fitted parameters (JSON)
        #[arg(long)]
        state_out: PathBuf,

        /// Write the transformed table here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Remove the schema's identifier columns first
        #[arg(long)]
        drop_ignored: bool,

        /// Renumber output rows from zero
        #[arg(long)]
        reset_index: bool,
    },

    /// Apply fitted feature parameters to a CSV
    Transform {
        /// Data to transform
        input: PathBuf,

        /// Parameters written by `fit`
        #[arg(long)]
        state: PathBuf,

        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long)]
        drop_ignored: bool,

        #[arg(long)]
        reset_index: bool,

        /// Input carries the target column; standardize it too
        #[arg(long)]
        with_target: bool,
    },

    /// Resolve a model URI and describe the artifact
    Info {
        #[arg(long)]
        model_uri: Option<String>,
    },

    /// Add an artifact to a local registry
    Publish {
        /// Artifact file (model.json / model.yaml)
        artifact: PathBuf,

        /// Registered model name
        #[arg(long)]
        name: String,

        /// Alias to point at the new version
        #[arg(long)]
        alias: Option<String>,
    },
}

/// Apply a `--model-uri` override and re-check the result
pub(crate) fn with_model_uri(
    mut config: AppConfig,
    model_uri: Option<String>,
) -> anyhow::Result<AppConfig> {
    if let Some(uri) = model_uri {
        config.registry.model_uri = uri;
        config.validate()?;
    }
    Ok(config)
}

//! Feature fitting command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::features::{drop_ignored, io, transform_training, TransformOptions};

/// Fit scaler and encoder on training data and persist them
pub async fn fit(
    config: AppConfig,
    input: PathBuf,
    state_out: PathBuf,
    output: Option<PathBuf>,
    drop_ids: bool,
    reset_index: bool,
) -> Result<()> {
    let mut table = io::read_csv_file(&input)?;
    if drop_ids {
        table = drop_ignored(&table, &config.schema);
    }
    tracing::info!(
        "Fitting on {} rows x {} columns from {}",
        table.num_rows(),
        table.num_columns(),
        input.display()
    );

    let (encoded, state) =
        transform_training(&table, &config.schema, None, TransformOptions { reset_index })?;

    let json = serde_json::to_string_pretty(&state)?;
    std::fs::write(&state_out, json)
        .with_context(|| format!("failed to write {}", state_out.display()))?;
    tracing::info!(
        "Wrote {} feature columns of state to {}",
        state.features.feature_names().len(),
        state_out.display()
    );

    super::transform::write_table(&encoded, output.as_deref())
}

//! Feature transform command

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::features::{
    drop_ignored, io, transform as apply, transform_training, Table, TrainingState,
    TransformOptions,
};

/// Apply persisted parameters without refitting
pub async fn transform(
    config: AppConfig,
    input: PathBuf,
    state_path: PathBuf,
    output: Option<PathBuf>,
    drop_ids: bool,
    reset_index: bool,
    with_target: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(&state_path)
        .with_context(|| format!("failed to read {}", state_path.display()))?;
    let state: TrainingState = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a fitted feature state", state_path.display()))?;
    state
        .validate()
        .with_context(|| format!("{} holds unusable feature parameters", state_path.display()))?;

    let mut table = io::read_csv_file(&input)?;
    if drop_ids {
        table = drop_ignored(&table, &config.schema);
    }

    let options = TransformOptions { reset_index };
    let encoded = if with_target {
        transform_training(&table, &config.schema, Some(&state), options)?.0
    } else {
        apply(&table, &config.schema, Some(&state.features), options)?.0
    };

    write_table(&encoded, output.as_deref())
}

/// Write a table as CSV to `path`, or stdout when `None`
pub(crate) fn write_table(table: &Table, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            io::write_csv(table, BufWriter::new(file))?;
            tracing::info!("Wrote {} rows to {}", table.num_rows(), path.display());
        }
        None => io::write_csv(table, std::io::stdout().lock())?,
    }
    Ok(())
}

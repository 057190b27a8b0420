//! Shared command utilities

use std::path::Path;

use anyhow::{Context, Result};
use slipscan_core::{Database, PipelineConfig};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Explicit `--config` file, else the data-dir override, else the embedded default
pub fn load_config(config_path: Option<&Path>) -> Result<PipelineConfig> {
    match config_path {
        Some(path) => PipelineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => PipelineConfig::load().context("Failed to load pipeline config"),
    }
}

//! Configuration management for the CLI
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `predictor.{toml,json,yaml}` in the working directory, `PREDICTOR_*`
//! environment variables, then command-line flags.

use anyhow::{Context, Result};
use predictor_lib::ArtifactPaths;
use std::path::PathBuf;

/// Resolve artifact locations
pub fn load(models_dir_override: Option<PathBuf>) -> Result<ArtifactPaths> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("predictor").required(false))
        .add_source(config::Environment::with_prefix("PREDICTOR"))
        .build()
        .context("Failed to read predictor configuration")?;

    let mut paths: ArtifactPaths = settings
        .try_deserialize()
        .context("Invalid predictor configuration")?;

    if let Some(models_dir) = models_dir_override {
        paths.models_dir = models_dir;
    }

    Ok(paths)
}

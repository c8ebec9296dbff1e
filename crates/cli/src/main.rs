//! Cancer Type Predictor CLI
//!
//! Loads the model artifacts once and classifies gene-expression profiles
//! or reports information about the loaded model.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{info, predict};
use predictor_lib::CancerPredictor;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cancer Type Predictor CLI
#[derive(Parser)]
#[command(name = "cancer-predict")]
#[command(author, version, about = "CLI for the Cancer Type Predictor", long_about = None)]
pub struct Cli {
    /// Directory containing the model artifacts (overrides PREDICTOR_MODELS_DIR)
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show information about the loaded model
    Info,

    /// Predict the cancer type of one expression profile
    Predict {
        /// JSON file holding an array of 7129 expression values ("-" for stdin)
        #[arg(long, short)]
        input: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = config::load(cli.models_dir)?;
    tracing::info!(models_dir = %paths.models_dir.display(), "Predictor configured");

    let predictor = CancerPredictor::load(&paths).with_context(|| {
        format!(
            "Failed to load model artifacts from {}",
            paths.models_dir.display()
        )
    })?;

    match cli.command {
        Commands::Info => info::show_model_info(&predictor, cli.format)?,
        Commands::Predict { input } => predict::run_prediction(&predictor, &input, cli.format)?,
    }

    Ok(())
}

//! CLI module for Leaf Ensemble
//!
//! Provides subcommands:
//! - `serve`: web UI and JSON API (default)
//! - `fetch`: download missing model artifacts and exit
//! - `predict`: classify a single image from the command line

pub mod fetch;
pub mod predict;
pub mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Leaf Ensemble - leaf disease classification with a three-model CNN ensemble
#[derive(Parser)]
#[command(name = "leaf-ensemble")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the web server (default mode)
    Serve,

    /// Download any missing model artifacts
    Fetch,

    /// Load all models and classify one image
    Predict(PredictArgs),
}

/// Arguments for the predict command
#[derive(Args, Clone)]
pub struct PredictArgs {
    /// Image file to classify
    pub image: PathBuf,
}

/// Load configuration and install logging, shared by every subcommand
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    logging::init_logging(&config.logging);

    if let Err(e) = loaded {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    config
}

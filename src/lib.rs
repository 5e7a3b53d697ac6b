//! Leaf Ensemble
//!
//! Classifies leaf photographs into disease categories by averaging the
//! softmax outputs of three CNNs (ResNet50V2, VGG16, InceptionV3):
//! - Model artifacts fetched once and cached on disk
//! - Background loading with an observable readiness state
//! - A small web UI and JSON API for uploads

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{ClassList, EnsemblePredictor, ReadinessState};
use infrastructure::{
    spawn_model_loader, HttpArtifactFetcher, LoadHandle, ModelLoader, OnnxDeserializer,
    UploadStore,
};
use tracing::info;

/// Loader wired to the HTTP fetcher and the ONNX backend
pub fn build_model_loader(config: &AppConfig) -> anyhow::Result<ModelLoader> {
    let fetcher = HttpArtifactFetcher::from_config(&config.models)?;

    Ok(ModelLoader::new(
        Arc::new(fetcher),
        Arc::new(OnnxDeserializer::new()),
        config.models.fetch_timeout(),
    ))
}

/// Create the application state and start loading models in the background
///
/// Returns as soon as the loader is spawned; the readiness state starts as
/// loading and settles once every model is loaded or one fails.
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<(AppState, LoadHandle)> {
    let classes = ClassList::new(config.classes.iter().cloned())?;

    std::fs::create_dir_all(&config.models.dir)?;
    std::fs::create_dir_all(&config.uploads.dir)?;

    let loader = build_model_loader(config)?;
    let readiness = ReadinessState::new();
    let handle = spawn_model_loader(loader, readiness.clone());

    info!(
        classes = classes.len(),
        models_dir = %config.models.dir.display(),
        uploads_dir = %config.uploads.dir.display(),
        "Application state created"
    );

    let state = AppState::new(
        readiness,
        EnsemblePredictor::new(classes),
        UploadStore::from_config(&config.uploads),
    );

    Ok((state, handle))
}

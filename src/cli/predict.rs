//! Predict command - classify one image without starting the server

use std::time::Instant;

use anyhow::Context;
use tracing::info;

use super::PredictArgs;
use crate::domain::{ClassList, EnsemblePredictor, Readiness};
use crate::infrastructure::LoadOutcome;

/// Load the ensemble in the foreground, then print the prediction as JSON
pub async fn run(args: PredictArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let classes = ClassList::new(config.classes.iter().cloned())?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let started = Instant::now();
    let loader = crate::build_model_loader(&config)?;
    let predictors = match loader.load_all().await {
        LoadOutcome::Ready(predictors) => predictors,
        LoadOutcome::Failed(e) => return Err(e).context("Model loading failed"),
    };
    info!(
        duration_ms = started.elapsed().as_millis() as u64,
        "Models loaded"
    );

    let ensemble = EnsemblePredictor::new(classes);
    let readiness = Readiness::ready(predictors)?;
    let result = tokio::task::spawn_blocking(move || ensemble.predict(&bytes, &readiness)).await??;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

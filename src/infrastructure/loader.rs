//! Background model loading
//!
//! [`ModelLoader::load_all`] fetches and deserializes the ensemble in fixed
//! order and stops at the first failure. [`spawn_model_loader`] runs it off the
//! request path and publishes the outcome into [`ReadinessState`] exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::domain::{
    ArtifactDeserializer, ArtifactFetcher, DomainError, ModelName, Predictor, PredictorSet,
    Readiness, ReadinessState,
};
use crate::infrastructure::observability::record_model_load;

/// Result of one load cycle
#[derive(Debug)]
pub enum LoadOutcome {
    Ready(PredictorSet),
    Failed(DomainError),
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Snapshot to publish; a failure never carries predictors
    pub fn into_readiness(self) -> Readiness {
        match self {
            Self::Ready(predictors) => {
                Readiness::ready(predictors).unwrap_or_else(|e| Readiness::failed(e.to_string()))
            }
            Self::Failed(err) => Readiness::failed(err.to_string()),
        }
    }
}

/// Fetches and deserializes every ensemble member
#[derive(Debug, Clone)]
pub struct ModelLoader {
    fetcher: Arc<dyn ArtifactFetcher>,
    deserializer: Arc<dyn ArtifactDeserializer>,
    fetch_timeout: Duration,
}

impl ModelLoader {
    pub fn new(
        fetcher: Arc<dyn ArtifactFetcher>,
        deserializer: Arc<dyn ArtifactDeserializer>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            deserializer,
            fetch_timeout,
        }
    }

    /// Load all models; any single failure fails the whole set
    pub async fn load_all(&self) -> LoadOutcome {
        let mut predictors = PredictorSet::new();

        for model in ModelName::ALL {
            match self.load_one(model).await {
                Ok(predictor) => predictors.insert(model, predictor),
                Err(e) => {
                    error!(model = %model, error = %e, "Model loading failed, discarding ensemble");
                    return LoadOutcome::Failed(e);
                }
            }
        }

        LoadOutcome::Ready(predictors)
    }

    #[instrument(skip(self), fields(model = %model))]
    async fn load_one(&self, model: ModelName) -> Result<Arc<dyn Predictor>, DomainError> {
        let started = Instant::now();

        let path = tokio::time::timeout(self.fetch_timeout, self.fetcher.ensure_local(model))
            .await
            .map_err(|_| {
                DomainError::fetch(
                    model.as_str(),
                    format!("timed out after {}s", self.fetch_timeout.as_secs()),
                )
            })??;

        let deserializer = Arc::clone(&self.deserializer);
        let predictor = tokio::task::spawn_blocking(move || deserializer.deserialize(model, &path))
            .await
            .map_err(|e| DomainError::deserialize(model.as_str(), format!("loader task failed: {}", e)))??;

        info!(
            model = %model,
            duration_ms = started.elapsed().as_millis() as u64,
            "Model loaded"
        );

        Ok(predictor)
    }
}

/// Handle to the background loading task
#[derive(Debug)]
pub struct LoadHandle {
    task: JoinHandle<()>,
    cancel: CancellationToken,
    state: ReadinessState,
}

impl LoadHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop loading; the state settles as failed if it was still loading
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the published snapshot
    pub async fn wait(&self) -> Arc<Readiness> {
        self.state.wait_until_settled().await
    }
}

/// Start loading in the background and return immediately
pub fn spawn_model_loader(loader: ModelLoader, state: ReadinessState) -> LoadHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let publish_to = state.clone();

    let task = tokio::spawn(async move {
        let started = Instant::now();
        info!("Starting background model loading");

        let mut load = tokio::spawn(async move { loader.load_all().await });

        let outcome = tokio::select! {
            _ = token.cancelled() => {
                load.abort();
                LoadOutcome::Failed(DomainError::Cancelled)
            }
            joined = &mut load => joined.unwrap_or_else(|e| {
                LoadOutcome::Failed(DomainError::internal(format!("loader task failed: {}", e)))
            }),
        };

        let success = outcome.is_ready();
        record_model_load(success, started.elapsed());

        if success {
            info!(
                duration_ms = started.elapsed().as_millis() as u64,
                "All models loaded"
            );
        }

        publish_to.publish(outcome.into_readiness());
    });

    LoadHandle {
        task,
        cancel,
        state,
    }
}

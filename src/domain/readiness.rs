//! Process-wide model readiness
//!
//! The state is one immutable [`Readiness`] value behind a `watch` channel.
//! Publishing swaps the whole value, so a reader sees either the previous
//! snapshot or the new one and never a ready flag without predictors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::model::ModelName;
use super::predictor::PredictorSet;
use super::DomainError;

/// Immutable readiness snapshot
#[derive(Debug, Clone)]
pub enum Readiness {
    /// Loader still running
    Loading,
    /// Every ensemble member loaded
    Ready {
        predictors: Arc<PredictorSet>,
        loaded_at: DateTime<Utc>,
    },
    /// Loading stopped; nothing is exposed
    Failed {
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl Readiness {
    /// Ready snapshot; fails unless every ensemble member is present
    pub fn ready(predictors: PredictorSet) -> Result<Self, DomainError> {
        if !predictors.is_complete() {
            return Err(DomainError::not_ready(format!(
                "expected {} models, {} loaded",
                ModelName::ALL.len(),
                predictors.len()
            )));
        }

        Ok(Self::Ready {
            predictors: Arc::new(predictors),
            loaded_at: Utc::now(),
        })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            failed_at: Utc::now(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Published predictors; `None` unless fully loaded
    pub fn predictors(&self) -> Option<&Arc<PredictorSet>> {
        match self {
            Self::Ready { predictors, .. } => Some(predictors),
            _ => None,
        }
    }

    /// Number of exposed predictors (zero unless ready)
    pub fn predictor_count(&self) -> usize {
        self.predictors().map_or(0, |p| p.len())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    /// When the snapshot left the loading state
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Loading => None,
            Self::Ready { loaded_at, .. } => Some(*loaded_at),
            Self::Failed { failed_at, .. } => Some(*failed_at),
        }
    }
}

/// Shared handle to the current readiness snapshot
#[derive(Debug, Clone)]
pub struct ReadinessState {
    tx: Arc<watch::Sender<Arc<Readiness>>>,
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessState {
    /// Starts in [`Readiness::Loading`]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Readiness::Loading));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot; never blocks on the loader
    pub fn get(&self) -> Arc<Readiness> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replace the loading snapshot with a terminal one
    ///
    /// Only the first call takes effect; returns `false` when the state had
    /// already settled. A ready snapshot missing an ensemble member is
    /// refused.
    pub fn publish(&self, outcome: Readiness) -> bool {
        if outcome.is_loading() || outcome.predictors().is_some_and(|p| !p.is_complete()) {
            return false;
        }

        let outcome = Arc::new(outcome);
        self.tx.send_if_modified(|current| {
            if current.is_loading() {
                *current = Arc::clone(&outcome);
                true
            } else {
                false
            }
        })
    }

    /// Resolves once the snapshot is no longer loading
    pub async fn wait_until_settled(&self) -> Arc<Readiness> {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|r| !r.is_loading()).await {
            Ok(settled) => Arc::clone(&settled),
            Err(_) => self.get(),
        }
    }
}

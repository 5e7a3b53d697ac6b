//! Application state shared by request handlers

use std::sync::Arc;

use crate::domain::{EnsemblePredictor, ReadinessState};
use crate::infrastructure::UploadStore;

/// Cheap to clone; every field is shared
#[derive(Debug, Clone)]
pub struct AppState {
    pub readiness: ReadinessState,
    pub ensemble: Arc<EnsemblePredictor>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(readiness: ReadinessState, ensemble: EnsemblePredictor, uploads: UploadStore) -> Self {
        Self {
            readiness,
            ensemble: Arc::new(ensemble),
            uploads: Arc::new(uploads),
        }
    }
}

//! Capabilities the ensemble consumes: predictors, deserializers, fetchers

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::model::ModelName;
use super::preprocess::ImageTensor;
use super::DomainError;

/// A loaded model that maps a prepared tensor to class probabilities
pub trait Predictor: Send + Sync + Debug {
    /// Returns one probability per entry of the shared class list
    fn classify(&self, tensor: &ImageTensor) -> Result<Vec<f32>, DomainError>;
}

/// Turns a local artifact file into an invokable predictor
pub trait ArtifactDeserializer: Send + Sync + Debug {
    fn deserialize(&self, model: ModelName, path: &Path)
        -> Result<Arc<dyn Predictor>, DomainError>;
}

/// Makes sure an artifact is present on local disk
#[async_trait]
pub trait ArtifactFetcher: Send + Sync + Debug {
    /// Returns the local path, downloading first when the file is absent
    async fn ensure_local(&self, model: ModelName) -> Result<PathBuf, DomainError>;
}

/// Predictors keyed by model; read-only once published
#[derive(Debug, Clone, Default)]
pub struct PredictorSet {
    predictors: HashMap<ModelName, Arc<dyn Predictor>>,
}

impl PredictorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: ModelName, predictor: Arc<dyn Predictor>) {
        self.predictors.insert(model, predictor);
    }

    pub fn get(&self, model: ModelName) -> Option<&Arc<dyn Predictor>> {
        self.predictors.get(&model)
    }

    pub fn len(&self) -> usize {
        self.predictors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictors.is_empty()
    }

    /// True when every ensemble member is present
    pub fn is_complete(&self) -> bool {
        ModelName::ALL.iter().all(|m| self.predictors.contains_key(m))
    }

    /// Loaded model names in ensemble order
    pub fn models(&self) -> Vec<ModelName> {
        ModelName::ALL
            .into_iter()
            .filter(|m| self.predictors.contains_key(m))
            .collect()
    }
}

impl FromIterator<(ModelName, Arc<dyn Predictor>)> for PredictorSet {
    fn from_iter<T: IntoIterator<Item = (ModelName, Arc<dyn Predictor>)>>(iter: T) -> Self {
        Self {
            predictors: iter.into_iter().collect(),
        }
    }
}

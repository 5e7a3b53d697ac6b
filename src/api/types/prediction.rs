//! Response bodies for the status and prediction endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClassProbability, ModelName, PredictionResult, Readiness};

pub const LOADING_MESSAGE: &str = "Models are still loading, please try again in a moment.";
pub const READY_MESSAGE: &str = "Models are ready.";

/// User-facing message for a failed load
pub fn unavailable_message(reason: &str) -> String {
    format!("Inference is unavailable: {}", reason)
}

/// Current readiness as reported to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: String,
    pub loaded: bool,
    pub error: Option<String>,
    pub models: Vec<ModelName>,
    pub classes: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl StatusResponse {
    pub fn from_readiness(readiness: &Readiness, classes: &[String]) -> Self {
        let message = match readiness {
            Readiness::Loading => LOADING_MESSAGE.to_string(),
            Readiness::Ready { .. } => READY_MESSAGE.to_string(),
            Readiness::Failed { reason, .. } => unavailable_message(reason),
        };

        Self {
            state: readiness.label().to_string(),
            loaded: readiness.is_loaded(),
            error: readiness.error().map(str::to_string),
            models: readiness
                .predictors()
                .map(|p| p.models())
                .unwrap_or_default(),
            classes: classes.to_vec(),
            message,
            settled_at: readiness.settled_at(),
        }
    }
}

/// Successful prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub label: String,
    /// Percentage with two decimals
    pub confidence: f64,
    pub probabilities: Vec<ProbabilityEntry>,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityEntry {
    pub label: String,
    pub probability: f64,
}

impl From<&ClassProbability> for ProbabilityEntry {
    fn from(p: &ClassProbability) -> Self {
        Self {
            label: p.label.clone(),
            probability: p.probability,
        }
    }
}

impl PredictionResponse {
    pub fn new(result: &PredictionResult, image_url: String) -> Self {
        Self {
            label: result.label.clone(),
            confidence: result.confidence,
            probabilities: result.probabilities.iter().map(Into::into).collect(),
            image_url,
        }
    }
}

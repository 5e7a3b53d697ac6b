//! Ensemble averaging over the three loaded models

use image::RgbImage;
use serde::Serialize;
use tracing::debug;

use super::classes::ClassList;
use super::model::ModelName;
use super::predictor::PredictorSet;
use super::preprocess::{decode_image, prepare};
use super::readiness::Readiness;
use super::DomainError;

/// Outcome of one ensemble prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: String,
    /// Winning probability as a percentage, two decimals
    pub confidence: f64,
    pub class_index: usize,
    pub probabilities: Vec<ClassProbability>,
}

/// Averaged probability for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Runs every ensemble member and averages their outputs
#[derive(Debug, Clone)]
pub struct EnsemblePredictor {
    classes: ClassList,
}

impl EnsemblePredictor {
    pub fn new(classes: ClassList) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    /// Predict from raw image bytes against a readiness snapshot
    ///
    /// Fails with [`DomainError::EnsembleNotReady`] unless the snapshot holds
    /// every ensemble member. Never waits for loading to finish.
    pub fn predict(
        &self,
        image_bytes: &[u8],
        readiness: &Readiness,
    ) -> Result<PredictionResult, DomainError> {
        let predictors = ready_predictors(readiness)?;
        let image = decode_image(image_bytes)?;

        self.predict_image(&image, predictors)
    }

    /// Predict from an already decoded image
    pub fn predict_image(
        &self,
        image: &RgbImage,
        predictors: &PredictorSet,
    ) -> Result<PredictionResult, DomainError> {
        if !predictors.is_complete() {
            return Err(DomainError::not_ready(format!(
                "expected {} models, {} loaded",
                ModelName::ALL.len(),
                predictors.len()
            )));
        }

        let mut outputs = Vec::with_capacity(ModelName::ALL.len());

        for model in ModelName::ALL {
            let predictor = predictors
                .get(model)
                .ok_or_else(|| DomainError::not_ready(format!("model '{}' is not loaded", model)))?;

            let tensor = prepare(image, model);
            let probabilities = predictor.classify(&tensor)?;
            self.check_output(model, &probabilities)?;

            debug!(model = %model, ?probabilities, "Model output");
            outputs.push(probabilities);
        }

        let combined = average(&outputs);
        self.resolve(&combined)
    }

    /// Turn a combined probability vector into a labelled result
    pub fn resolve(&self, combined: &[f64]) -> Result<PredictionResult, DomainError> {
        if combined.len() != self.classes.len() {
            return Err(DomainError::validation(format!(
                "combined vector has {} entries, class list has {}",
                combined.len(),
                self.classes.len()
            )));
        }

        let index = argmax(combined)
            .ok_or_else(|| DomainError::validation("combined vector is empty"))?;

        let label = self
            .classes
            .label(index)
            .ok_or_else(|| DomainError::validation(format!("no class label at index {}", index)))?
            .to_string();

        let probabilities = self
            .classes
            .labels()
            .iter()
            .zip(combined)
            .map(|(label, p)| ClassProbability {
                label: label.clone(),
                probability: *p,
            })
            .collect();

        Ok(PredictionResult {
            label,
            confidence: round_percent(combined[index]),
            class_index: index,
            probabilities,
        })
    }

    fn check_output(&self, model: ModelName, probabilities: &[f32]) -> Result<(), DomainError> {
        if probabilities.len() != self.classes.len() {
            return Err(DomainError::inference(
                model.as_str(),
                format!(
                    "expected {} probabilities, got {}",
                    self.classes.len(),
                    probabilities.len()
                ),
            ));
        }

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(DomainError::inference(
                model.as_str(),
                "output contains non-finite values",
            ));
        }

        Ok(())
    }
}

fn ready_predictors(readiness: &Readiness) -> Result<&PredictorSet, DomainError> {
    match readiness {
        Readiness::Ready { predictors, .. } => Ok(predictors.as_ref()),
        Readiness::Loading => Err(DomainError::not_ready("models are still loading")),
        Readiness::Failed { reason, .. } => Err(DomainError::not_ready(format!(
            "model loading failed: {}",
            reason
        ))),
    }
}

/// Element-wise arithmetic mean of equally sized vectors
pub fn average(vectors: &[Vec<f32>]) -> Vec<f64> {
    let Some(width) = vectors.iter().map(Vec::len).max() else {
        return Vec::new();
    };

    let count = vectors.len() as f64;
    let mut sums = vec![0.0f64; width];

    for vector in vectors {
        for (sum, value) in sums.iter_mut().zip(vector) {
            *sum += f64::from(*value);
        }
    }

    sums.into_iter().map(|s| s / count).collect()
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, value) in values.iter().copied().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, _)| index)
}

fn round_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

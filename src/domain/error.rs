use thiserror::Error;

/// Core domain errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Failed to fetch artifact for model '{model}': {message}")]
    Fetch { model: String, message: String },

    #[error("Failed to load model '{model}': {message}")]
    Deserialize { model: String, message: String },

    #[error("Unsupported model: '{name}'")]
    UnsupportedModel { name: String },

    #[error("Invalid image: {message}")]
    ImageDecode { message: String },

    #[error("Ensemble not ready: {message}")]
    EnsembleNotReady { message: String },

    #[error("Inference failed for model '{model}': {message}")]
    Inference { model: String, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Model loading was cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn fetch(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn deserialize(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deserialize {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_model(name: impl Into<String>) -> Self {
        Self::UnsupportedModel { name: name.into() }
    }

    pub fn image_decode(message: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: message.into(),
        }
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::EnsembleNotReady {
            message: message.into(),
        }
    }

    pub fn inference(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inference {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

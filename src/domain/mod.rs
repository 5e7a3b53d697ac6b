//! Domain layer - models, preprocessing, readiness, and ensemble logic

pub mod classes;
pub mod ensemble;
pub mod error;
pub mod model;
pub mod predictor;
pub mod preprocess;
pub mod readiness;

pub use classes::ClassList;
pub use ensemble::{argmax, average, ClassProbability, EnsemblePredictor, PredictionResult};
pub use error::DomainError;
pub use model::{ModelInputSpec, ModelName, Normalization};
pub use predictor::{ArtifactDeserializer, ArtifactFetcher, Predictor, PredictorSet};
pub use preprocess::{decode_image, prepare, prepare_named, ImageTensor};
pub use readiness::{Readiness, ReadinessState};

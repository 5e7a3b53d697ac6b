//! Infrastructure layer - artifact retrieval, inference backends, and I/O adapters

pub mod artifact;
pub mod inference;
pub mod loader;
pub mod logging;
pub mod observability;
pub mod uploads;

pub use artifact::HttpArtifactFetcher;
pub use inference::OnnxDeserializer;
pub use loader::{spawn_model_loader, LoadHandle, LoadOutcome, ModelLoader};
pub use uploads::{sanitize_filename, StoredUpload, UploadStore};

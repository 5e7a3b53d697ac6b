//! Local storage for uploaded leaf images

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::UploadsConfig;
use crate::domain::DomainError;

/// Characters allowed to survive in a stored file name
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// URL prefix under which stored uploads are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// A file written by [`UploadStore::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub file_name: String,
    pub path: PathBuf,
}

impl StoredUpload {
    /// Public location of the stored image
    pub fn url(&self) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, self.file_name)
    }
}

/// Validates and persists uploads under one directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, allowed_extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &UploadsConfig) -> Self {
        Self::new(&config.dir, &config.allowed_extensions)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Whether `file_name` carries one of the allowed extensions
    pub fn is_allowed(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }

    /// Store `bytes` under a sanitized, unique name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload, DomainError> {
        if original_name.trim().is_empty() {
            return Err(DomainError::validation("No file selected"));
        }

        if !self.is_allowed(original_name) {
            return Err(DomainError::validation(format!(
                "File type not allowed. Allowed types: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        if bytes.is_empty() {
            return Err(DomainError::validation("Uploaded file is empty"));
        }

        let sanitized = sanitize_filename(original_name);
        let file_name = format!("{}_{}", uuid::Uuid::new_v4().simple(), sanitized);
        let path = self.dir.join(&file_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create upload directory: {}", e)))?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to save upload: {}", e)))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Upload stored");

        Ok(StoredUpload { file_name, path })
    }

    /// Delete a stored upload; missing files are ignored
    pub async fn remove(&self, upload: &StoredUpload) {
        match tokio::fs::remove_file(&upload.path).await {
            Ok(()) => debug!(path = %upload.path.display(), "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %upload.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// Reduce a client-supplied name to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

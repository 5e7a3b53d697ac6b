//! Artifact fetcher backed by a local directory and HTTP downloads

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::ModelsConfig;
use crate::domain::{ArtifactFetcher, DomainError, ModelName};

/// Downloads missing artifacts into `dir`; file presence is the cache hit
#[derive(Debug, Clone)]
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
    dir: PathBuf,
    sources: HashMap<ModelName, String>,
}

impl HttpArtifactFetcher {
    /// Create a fetcher with no remote sources
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            dir: dir.into(),
            sources: HashMap::new(),
        })
    }

    pub fn from_config(config: &ModelsConfig) -> Result<Self, DomainError> {
        let mut fetcher = Self::new(&config.dir, config.fetch_timeout())?;

        for model in ModelName::ALL {
            if let Some(url) = config.source_url(model) {
                fetcher = fetcher.with_source(model, url);
            }
        }

        Ok(fetcher)
    }

    pub fn with_source(mut self, model: ModelName, url: impl Into<String>) -> Self {
        self.sources.insert(model, url.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic local path for `model`
    pub fn local_path(&self, model: ModelName) -> PathBuf {
        self.dir.join(model.artifact_file_name())
    }

    /// Unique per download so concurrent fetchers never share a temp file
    fn partial_path(&self, model: ModelName) -> PathBuf {
        self.dir.join(format!(
            "{}.{}.part",
            model.artifact_file_name(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    async fn download(&self, model: ModelName, url: &str, dest: &Path) -> Result<u64, DomainError> {
        let fetch_err = |message: String| DomainError::fetch(model.as_str(), message);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status)));
        }

        let expected = response.content_length();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| fetch_err(format!("Failed to create {}: {}", dest.display(), e)))?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| fetch_err(format!("Download interrupted: {}", e)))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| fetch_err(format!("Failed to write artifact: {}", e)))?;
            written += chunk.len() as u64;
        }

        file.sync_all()
            .await
            .map_err(|e| fetch_err(format!("Failed to flush artifact: {}", e)))?;

        if written == 0 {
            return Err(fetch_err("Empty response body".to_string()));
        }

        if let Some(expected) = expected {
            if expected != written {
                return Err(fetch_err(format!(
                    "Incomplete download: {} of {} bytes",
                    written, expected
                )));
            }
        }

        Ok(written)
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    #[instrument(skip(self), fields(model = %model))]
    async fn ensure_local(&self, model: ModelName) -> Result<PathBuf, DomainError> {
        let path = self.local_path(model);

        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            debug!(path = %path.display(), "Artifact already present");
            return Ok(path);
        }

        let url = self.sources.get(&model).ok_or_else(|| {
            DomainError::fetch(
                model.as_str(),
                format!(
                    "{} not found and no remote URL is configured",
                    path.display()
                ),
            )
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            DomainError::fetch(
                model.as_str(),
                format!("Failed to create {}: {}", self.dir.display(), e),
            )
        })?;

        info!(url = %url, "Downloading model artifact");
        let partial = self.partial_path(model);

        let bytes = match self.download(model, url, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(error = %remove_err, "Failed to remove partial download");
                    }
                }
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, &path).await.map_err(|e| {
            DomainError::fetch(
                model.as_str(),
                format!("Failed to move artifact into place: {}", e),
            )
        })?;

        info!(path = %path.display(), bytes, "Model artifact downloaded");
        Ok(path)
    }
}

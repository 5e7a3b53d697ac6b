use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::ModelName;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    /// Disease labels in model output order
    #[serde(default = "default_classes")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Local artifact store and remote sources
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,
    /// Upper bound for downloading a single artifact
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub resnet: ArtifactSourceConfig,
    #[serde(default)]
    pub vgg: ArtifactSourceConfig,
    #[serde(default)]
    pub inception: ArtifactSourceConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ArtifactSourceConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_uploads_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_classes() -> Vec<String> {
    ["Blight", "Common_Rust", "Gray_Leaf_Spot", "Healthy"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_fetch_timeout_secs() -> u64 {
    600
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("static/uploads")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            models: ModelsConfig::default(),
            classes: default_classes(),
            uploads: UploadsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            resnet: ArtifactSourceConfig::default(),
            vgg: ArtifactSourceConfig::default(),
            inception: ArtifactSourceConfig::default(),
        }
    }
}

impl ModelsConfig {
    /// Remote location of the artifact for `model`, if configured
    pub fn source_url(&self, model: ModelName) -> Option<&str> {
        let source = match model {
            ModelName::Resnet => &self.resnet,
            ModelName::Vgg => &self.vgg,
            ModelName::Inception => &self.inception,
        };

        source.url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
            max_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.with_port_override(std::env::var("PORT").ok().as_deref())
    }

    /// Apply the platform `PORT` variable on top of `server.port`
    pub fn with_port_override(mut self, port: Option<&str>) -> Result<Self, config::ConfigError> {
        if let Some(port) = port.map(str::trim).filter(|p| !p.is_empty()) {
            self.server.port = port
                .parse()
                .map_err(|_| config::ConfigError::Message(format!("Invalid PORT value '{}'", port)))?;
        }

        Ok(self)
    }
}

/// `APP__<SECTION>__<KEY>` variables, e.g. `APP__MODELS__RESNET__URL`
fn environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("classes")
        .with_list_parse_key("uploads.allowed_extensions")
        .try_parsing(true)
}

//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ArtifactSourceConfig, LogFormat, LoggingConfig, MetricsConfig, ModelsConfig,
    ServerConfig, UploadsConfig,
};

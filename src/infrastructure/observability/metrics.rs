//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_default_metrics();

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn register_default_metrics() {
    gauge!("leaf_ensemble_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    gauge!("leaf_models_ready").set(0.0);
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record one ensemble prediction
pub fn record_prediction(outcome: &str, duration: Duration) {
    let labels = [("status", outcome.to_string())];

    counter!("leaf_predictions_total", &labels).increment(1);
    histogram!("leaf_prediction_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record the end of the background load
pub fn record_model_load(success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };

    histogram!("leaf_model_load_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
    gauge!("leaf_models_ready").set(if success { 1.0 } else { 0.0 });
}

/// Uploaded file names end up in paths; keep label cardinality bounded
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/uploads/") {
        return "/uploads/{file}".to_string();
    }

    path.chars().take(50).collect()
}

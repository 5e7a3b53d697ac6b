//! Health check endpoints for container orchestrators

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;
use crate::domain::Readiness;

/// Health response with optional component checks
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Starting,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Process is up; says nothing about models
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// 200 only once every ensemble member is loaded
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let check = ensemble_check(&state.readiness.get());
    let status = check.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![check]),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Starting | HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn ensemble_check(readiness: &Readiness) -> HealthCheck {
    let (status, message) = match readiness {
        Readiness::Loading => (HealthStatus::Starting, Some("models loading".to_string())),
        Readiness::Ready { predictors, .. } => (
            HealthStatus::Healthy,
            Some(format!("{} models loaded", predictors.len())),
        ),
        Readiness::Failed { reason, .. } => (HealthStatus::Unhealthy, Some(reason.clone())),
    };

    HealthCheck {
        name: "model_ensemble".to_string(),
        status,
        message,
    }
}

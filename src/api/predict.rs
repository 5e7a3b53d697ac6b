//! Upload-and-classify endpoint

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use super::state::AppState;
use super::types::{unavailable_message, ApiError, ApiErrorType, PredictionResponse, LOADING_MESSAGE};
use crate::domain::{DomainError, Readiness};
use crate::infrastructure::observability::record_prediction;

const FILE_FIELD: &str = "file";

/// POST /api/predict
///
/// Expects a multipart body with the image in the `file` field.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start = Instant::now();

    let readiness = state.readiness.get();
    check_ready(&readiness)?;

    let (file_name, bytes) = read_file_field(multipart).await?;
    let stored = state.uploads.save(&file_name, &bytes).await?;

    let ensemble = state.ensemble.clone();
    let snapshot = readiness.clone();
    let outcome = tokio::task::spawn_blocking(move || ensemble.predict(&bytes, &snapshot))
        .await
        .unwrap_or_else(|e| Err(DomainError::internal(format!("prediction task failed: {}", e))));

    match outcome {
        Ok(result) => {
            record_prediction("success", start.elapsed());
            info!(
                file = %stored.file_name,
                label = %result.label,
                confidence = result.confidence,
                "Prediction completed"
            );

            Ok(Json(PredictionResponse::new(&result, stored.url())))
        }
        Err(e) => {
            record_prediction("error", start.elapsed());
            warn!(file = %stored.file_name, error = %e, "Prediction failed");
            state.uploads.remove(&stored).await;

            let message = format!("Prediction failed: {}", e);
            Err(ApiError::from(e).with_message(message))
        }
    }
}

fn check_ready(readiness: &Readiness) -> Result<(), ApiError> {
    match readiness {
        Readiness::Ready { .. } => Ok(()),
        Readiness::Loading => Err(ApiError::unavailable(LOADING_MESSAGE).with_code("models_loading")),
        Readiness::Failed { reason, .. } => {
            Err(ApiError::unavailable(unavailable_message(reason)).with_code("models_failed"))
        }
    }
}

/// First `file` field as (client file name, contents)
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::new(
            e.status(),
            ApiErrorType::InvalidRequestError,
            format!("Failed to read multipart field: {}", e.body_text()),
        )
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            ApiError::new(
                e.status(),
                ApiErrorType::InvalidRequestError,
                format!("Failed to read file '{}': {}", file_name, e.body_text()),
            )
        })?;

        return Ok((file_name, bytes));
    }

    Err(ApiError::bad_request("No file part in the request"))
}

use axum::{extract::State, Json};

use super::state::AppState;
use super::types::StatusResponse;

/// Current loading state for the UI to poll
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let readiness = state.readiness.get();

    Json(StatusResponse::from_readiness(
        &readiness,
        state.ensemble.classes().labels(),
    ))
}

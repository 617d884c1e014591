use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::store::{RaceIntent, RaceUiState};

/// Get the current race board.
///
/// Races are ordered by advertised start and carry pre-formatted countdowns
/// that are recomputed every tick.
#[utoipa::path(
    get,
    path = "/api/v1/races",
    tag = "Races",
    responses(
        (status = 200, description = "Current race board snapshot", body = RaceUiState),
    )
)]
pub async fn get_race_board(State(state): State<AppState>) -> Json<RaceUiState> {
    Json(state.store.snapshot())
}

/// Submit a user intent (load, refresh, toggle a category, clear filters).
///
/// Accepted intents are applied asynchronously; watch `/api/v1/races` or the
/// event stream for the outcome.
#[utoipa::path(
    post,
    path = "/api/v1/intents",
    tag = "Races",
    request_body = RaceIntent,
    responses(
        (status = 202, description = "Intent accepted"),
        (status = 400, description = "Malformed intent", body = ErrorResponse),
        (status = 503, description = "Race store has shut down", body = ErrorResponse),
    )
)]
pub async fn post_intent(
    State(state): State<AppState>,
    payload: Result<Json<RaceIntent>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(intent) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    state
        .store
        .dispatch(intent)
        .await
        .map_err(|_| AppError::StoreClosed)?;
    Ok(StatusCode::ACCEPTED)
}

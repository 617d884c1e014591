use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" while the race store runs, "degraded" after it stopped)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the race store still accepts intents
    pub store_running: bool,
}

/// Health check endpoint.
///
/// Returns status "degraded" (still 200) once the race store has shut down,
/// so load balancers can distinguish partial failures.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let running = !state.store.is_closed();

    Json(HealthResponse {
        status: if running {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_running: running,
    })
}

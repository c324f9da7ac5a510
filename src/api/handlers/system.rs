//! Health check endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::ApiError;

/// System routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// `GET /api/health` — Liveness plus a store round-trip.
///
/// # Errors
///
/// Returns [`ApiError::Database`] when the store is unreachable.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    summary = "Health check",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 500, description = "Store unreachable"),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.store.pool())
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

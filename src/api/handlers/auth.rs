//! Session status endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::auth_dto::SessionStatusResponse;
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::session::MaybeUser;

/// Auth routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/session", get(session_status_handler))
}

/// `GET /api/auth/session` — Who am I, according to the cookie.
///
/// # Errors
///
/// Infallible beyond transport.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "Auth",
    summary = "Current session status",
    responses(
        (status = 200, description = "Session status", body = SessionStatusResponse),
    )
)]
pub async fn session_status_handler(
    State(_state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(SessionStatusResponse {
        authenticated: user.is_some(),
        user,
    }))
}

//! Waitlist subscription and notification endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::notification_dto::{
    NotificationItem, NotificationListQuery, NotificationListResponse, ReadAllResponse,
    SubscribeRequest, SubscribeResponse,
};
use crate::app_state::AppState;
use crate::domain::WaitlistKind;
use crate::error::{ApiError, ErrorResponse};
use crate::session::RequireUser;

/// Notification routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/subscribe", post(subscribe_handler))
        .route("/notifications/read-all", post(mark_all_read_handler))
        .route("/notifications/{id}/read", post(mark_read_handler))
}

/// `POST /api/notifications/subscribe` — Join a room's waitlist.
///
/// # Errors
///
/// Returns [`ApiError::Validation`], [`ApiError::DuplicateWaitlist`] or
/// [`ApiError::PriorityAlreadyTaken`].
#[utoipa::path(
    post,
    path = "/api/notifications/subscribe",
    tag = "Notifications",
    summary = "Subscribe to a room's waitlist",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscribeResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "Duplicate or priority taken", body = ErrorResponse),
    )
)]
pub async fn subscribe_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<axum::response::Response, ApiError> {
    let Some(kind) = WaitlistKind::parse(request.kind.as_deref().unwrap_or("")) else {
        let body = serde_json::json!({ "error": "invalid_waitlist_type" });
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    };

    let (id, group_id) = state
        .waitlist
        .subscribe(
            user.id,
            request.room_id.as_deref().unwrap_or(""),
            request.check_in.as_deref().unwrap_or(""),
            request.check_out.as_deref().unwrap_or(""),
            kind,
        )
        .await?;

    let response = SubscribeResponse {
        id,
        group_id,
        message: "Subscription created".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// `GET /api/notifications` — The caller's newest notifications plus
/// the unread count.
///
/// # Errors
///
/// Returns store failures as [`ApiError`].
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    summary = "List notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn list_notifications_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, unread_count) = state
        .waitlist
        .list_notifications(user.id, query.limit.unwrap_or(50))
        .await?;

    Ok(Json(NotificationListResponse {
        items: items.into_iter().map(NotificationItem::from).collect(),
        unread_count,
    }))
}

/// `POST /api/notifications/{id}/read` — Mark one notification read.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for rows the caller does not own.
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark a notification read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 404, description = "No such notification", body = ErrorResponse),
    )
)]
pub async fn mark_read_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // A malformed id reads the same as a missing row.
    let id: Uuid = id.trim().parse().map_err(|_| ApiError::NotFound)?;
    state.waitlist.mark_read(user.id, id).await?;

    Ok(Json(
        serde_json::json!({ "message": "Notification marked as read" }),
    ))
}

/// `POST /api/notifications/read-all` — Mark every notification read.
/// Idempotent.
///
/// # Errors
///
/// Returns store failures as [`ApiError`].
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    summary = "Mark all notifications read",
    responses(
        (status = 200, description = "Marked read", body = ReadAllResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.waitlist.mark_all_read(user.id).await?;

    Ok(Json(ReadAllResponse {
        message: "All notifications marked as read".to_string(),
        updated,
    }))
}

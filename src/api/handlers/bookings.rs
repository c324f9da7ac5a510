//! Booking endpoints: availability preflight, CRUD and the
//! group-id lookup for priority-waitlist winners.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::booking_dto::{
    AvailabilityQuery, AvailabilityResponse, BookingCreatedResponse, BookingItem,
    BookingListQuery, BookingListResponse, BookingWriteRequest,
};
use crate::app_state::AppState;
use crate::domain::dates::today_local;
use crate::domain::pagination::{PageQuery, Pagination, PaginationMeta};
use crate::domain::validation::{validate_booking_create, validate_booking_patch};
use crate::error::{ApiError, ErrorResponse};
use crate::persistence::bookings::{self, BookingFilter};
use crate::session::RequireUser;

/// Booking routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bookings",
            get(list_bookings_handler).post(create_booking_handler),
        )
        .route("/bookings/availability", get(availability_handler))
        .route("/bookings/by-group", get(booking_by_group_handler))
        .route(
            "/bookings/{id}",
            get(get_booking_handler)
                .put(update_booking_handler)
                .delete(delete_booking_handler),
        )
}

/// `GET /api/bookings/availability` — Would a create succeed right now?
///
/// Best-effort preflight for the booking form; the ledger re-gates on
/// the actual write.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for malformed parameters.
#[utoipa::path(
    get,
    path = "/api/bookings/availability",
    tag = "Bookings",
    summary = "Check room availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Availability verdict", body = AvailabilityResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
    )
)]
pub async fn availability_handler(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let available = state
        .bookings
        .check_availability(
            query.room_id.as_deref().unwrap_or(""),
            query.check_in.as_deref().unwrap_or(""),
            query.check_out.as_deref().unwrap_or(""),
            query.exclude_booking_id.as_deref(),
        )
        .await?;

    let response = if available {
        AvailabilityResponse {
            available: true,
            error: None,
            message: None,
        }
    } else {
        AvailabilityResponse {
            available: false,
            error: Some("booking_conflict".to_string()),
            message: Some("Room is occupied for selected dates".to_string()),
        }
    };
    Ok(Json(response))
}

/// `GET /api/bookings` — List bookings visible to the caller.
///
/// Admins may pass `scope=all`; everyone else sees their own rows.
///
/// # Errors
///
/// Returns store failures as [`ApiError`].
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    summary = "List bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Paginated bookings", body = BookingListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn list_bookings_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let include_all = user.is_admin() && query.scope.as_deref() == Some("all");
    let filter = BookingFilter {
        user_id: (!include_all).then_some(user.id),
        room_id: query
            .room_id
            .as_deref()
            .and_then(|text| text.trim().parse().ok()),
    };

    let pagination = Pagination::resolve(
        PageQuery {
            page: query.page,
            limit: query.limit,
        },
        state.config.bookings_page_size,
        state.config.bookings_page_max,
    );

    let items = bookings::list_bookings(
        state.store.pool(),
        filter,
        i64::from(pagination.limit),
        pagination.offset,
    )
    .await?;
    let total = bookings::count_bookings(state.store.pool(), filter).await?;

    Ok(Json(BookingListResponse {
        items: items.into_iter().map(BookingItem::from).collect(),
        meta: PaginationMeta::new(total, pagination),
    }))
}

/// `GET /api/bookings/{id}` — Booking details, owner or admin only.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] or [`ApiError::Forbidden`].
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    summary = "Get one booking",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking details", body = BookingItem),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "No such booking", body = ErrorResponse),
    )
)]
pub async fn get_booking_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = bookings::find_booking_details(state.store.pool(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !user.can_access_owned(booking.user_id) {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(BookingItem::from(booking)))
}

/// `POST /api/bookings` — Create a confirmed booking.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for bad payloads and
/// [`ApiError::BookingConflict`] when any night is taken.
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    request_body = BookingWriteRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingCreatedResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "Nights already taken", body = ErrorResponse),
    )
)]
pub async fn create_booking_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<BookingWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate_booking_create(
        request.room_id.as_deref(),
        request.check_in.as_deref(),
        request.check_out.as_deref(),
        request.guests.as_ref(),
        request.notes.as_deref(),
        request.group_id.as_deref(),
        today_local(),
    )
    .map_err(first_problem)?;

    let id = state.bookings.create_booking(&draft, user.id).await?;
    Ok((StatusCode::CREATED, Json(BookingCreatedResponse { id })))
}

/// `PUT /api/bookings/{id}` — Patch a booking, owner or admin only.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`], [`ApiError::Forbidden`],
/// [`ApiError::Validation`] or [`ApiError::BookingConflict`].
#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    summary = "Update a booking",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = BookingWriteRequest,
    responses(
        (status = 200, description = "Booking updated"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No such booking", body = ErrorResponse),
        (status = 409, description = "Nights already taken", body = ErrorResponse),
    )
)]
pub async fn update_booking_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    Json(request): Json<BookingWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = bookings::find_booking_details(state.store.pool(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !user.can_access_owned(existing.user_id) {
        return Err(ApiError::Forbidden);
    }

    let patch = validate_booking_patch(
        request.room_id.as_deref(),
        request.check_in.as_deref(),
        request.check_out.as_deref(),
        request.guests.as_ref(),
        request.notes.as_deref(),
        request.group_id.as_deref(),
    )
    .map_err(first_problem)?;

    state.bookings.update_booking(id, &patch).await?;
    Ok(Json(serde_json::json!({ "message": "Updated" })))
}

/// `DELETE /api/bookings/{id}` — Delete a booking, owner or admin only.
/// Frees the nights and triggers waitlist dispatch for the room.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] or [`ApiError::Forbidden`].
#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    summary = "Delete a booking",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking deleted"),
        (status = 404, description = "No such booking", body = ErrorResponse),
    )
)]
pub async fn delete_booking_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let existing = bookings::find_booking_details(state.store.pool(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    if !user.can_access_owned(existing.user_id) {
        return Err(ApiError::Forbidden);
    }

    state.bookings.delete_booking(id).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

/// `GET /api/bookings/by-group` — The caller's booking minted from a
/// priority-waitlist group.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] or [`ApiError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/bookings/by-group",
    tag = "Bookings",
    summary = "Find the caller's booking by waitlist group",
    params(("group_id" = String, Query, description = "Waitlist group id")),
    responses(
        (status = 200, description = "Booking", body = BookingItem),
        (status = 404, description = "No booking for this group", body = ErrorResponse),
    )
)]
pub async fn booking_by_group_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<std::collections::HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let group_id: Uuid = query
        .get("group_id")
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::Validation("group_id required".to_string()))?
        .parse()
        .map_err(|_| ApiError::Validation("invalid group id".to_string()))?;

    let booking = bookings::find_booking_by_group_and_user(state.store.pool(), group_id, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(BookingItem::from(booking)))
}

/// Surfaces the first collected validation problem.
pub(crate) fn first_problem(problems: Vec<String>) -> ApiError {
    ApiError::Validation(
        problems
            .into_iter()
            .next()
            .unwrap_or_else(|| "invalid payload".to_string()),
    )
}

//! Hotel endpoints: listing, details, admin CRUD and rating.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::hotel_dto::{
    HotelCreatedResponse, HotelItem, HotelListQuery, HotelListResponse, RateRequest, RateResponse,
};
use crate::api::handlers::bookings::first_problem;
use crate::app_state::AppState;
use crate::domain::pagination::{PageQuery, Pagination, PaginationMeta};
use crate::domain::validation::{int_from_value, validate_hotel_payload};
use crate::error::{ApiError, ErrorResponse};
use crate::persistence::hotels::{self, HotelFilter};
use crate::session::{RequireAdmin, RequireUser};

/// Hotel routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hotels", get(list_hotels_handler).post(create_hotel_handler))
        .route(
            "/hotels/{id}",
            get(get_hotel_handler)
                .put(update_hotel_handler)
                .delete(delete_hotel_handler),
        )
        .route("/hotels/{id}/rate", post(rate_hotel_handler))
}

/// `GET /api/hotels` — Paginated hotel list with substring search and
/// a city filter.
///
/// # Errors
///
/// Returns store failures as [`ApiError`].
#[utoipa::path(
    get,
    path = "/api/hotels",
    tag = "Hotels",
    summary = "List hotels",
    params(HotelListQuery),
    responses(
        (status = 200, description = "Paginated hotels", body = HotelListResponse),
    )
)]
pub async fn list_hotels_handler(
    State(state): State<AppState>,
    Query(query): Query<HotelListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = HotelFilter {
        query: query.q.clone().filter(|q| !q.trim().is_empty()),
        city: query.city.clone().filter(|city| !city.trim().is_empty()),
    };

    let pagination = Pagination::resolve(
        PageQuery {
            page: query.page,
            limit: query.limit,
        },
        state.config.hotels_page_size,
        state.config.hotels_page_max,
    );

    let items = hotels::list_hotels(
        state.store.pool(),
        &filter,
        i64::from(pagination.limit),
        pagination.offset,
    )
    .await?;
    let total = hotels::count_hotels(state.store.pool(), &filter).await?;
    let cities = hotels::distinct_cities(state.store.pool()).await?;

    Ok(Json(HotelListResponse {
        items: items.into_iter().map(HotelItem::from).collect(),
        meta: PaginationMeta::new(total, pagination),
        cities,
    }))
}

/// `GET /api/hotels/{id}` — One hotel.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    summary = "Get one hotel",
    params(("id" = Uuid, Path, description = "Hotel id")),
    responses(
        (status = 200, description = "Hotel", body = HotelItem),
        (status = 404, description = "No such hotel", body = ErrorResponse),
    )
)]
pub async fn get_hotel_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let hotel = hotels::find_hotel_by_id(state.store.pool(), id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(HotelItem::from(hotel)))
}

/// `POST /api/hotels` — Create a hotel. Admin only.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] or [`ApiError::Forbidden`].
#[utoipa::path(
    post,
    path = "/api/hotels",
    tag = "Hotels",
    summary = "Create a hotel",
    responses(
        (status = 201, description = "Hotel created", body = HotelCreatedResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
    )
)]
pub async fn create_hotel_handler(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate_hotel_payload(&payload, false).map_err(first_problem)?;
    let id = hotels::insert_hotel(state.store.pool(), &draft, admin.id).await?;
    Ok((StatusCode::CREATED, Json(HotelCreatedResponse { id })))
}

/// `PUT /api/hotels/{id}` — Partially update a hotel. Admin only.
///
/// # Errors
///
/// Returns [`ApiError::Validation`], [`ApiError::Forbidden`] or
/// [`ApiError::NotFound`].
#[utoipa::path(
    put,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    summary = "Update a hotel",
    params(("id" = Uuid, Path, description = "Hotel id")),
    responses(
        (status = 200, description = "Hotel updated"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "No such hotel", body = ErrorResponse),
    )
)]
pub async fn update_hotel_handler(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate_hotel_payload(&payload, true).map_err(first_problem)?;
    if !hotels::update_hotel(state.store.pool(), id, &draft).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(serde_json::json!({ "message": "Updated" })))
}

/// `DELETE /api/hotels/{id}` — Delete a hotel. Admin only.
///
/// # Errors
///
/// Returns [`ApiError::Forbidden`] or [`ApiError::NotFound`].
#[utoipa::path(
    delete,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    summary = "Delete a hotel",
    params(("id" = Uuid, Path, description = "Hotel id")),
    responses(
        (status = 200, description = "Hotel deleted"),
        (status = 404, description = "No such hotel", body = ErrorResponse),
    )
)]
pub async fn delete_hotel_handler(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !hotels::delete_hotel(state.store.pool(), id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

/// `POST /api/hotels/{id}/rate` — Fold one rating vote in. Requires
/// authentication.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] or [`ApiError::NotFound`].
#[utoipa::path(
    post,
    path = "/api/hotels/{id}/rate",
    tag = "Hotels",
    summary = "Rate a hotel",
    params(("id" = Uuid, Path, description = "Hotel id")),
    request_body = RateRequest,
    responses(
        (status = 200, description = "New rating", body = RateResponse),
        (status = 400, description = "Invalid score", body = ErrorResponse),
        (status = 404, description = "No such hotel", body = ErrorResponse),
    )
)]
pub async fn rate_hotel_handler(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let score = request
        .rating
        .as_ref()
        .and_then(int_from_value)
        .filter(|score| (1..=5).contains(score))
        .ok_or_else(|| ApiError::Validation("Rating must be between 1 and 5".to_string()))?;

    let (rating, rating_votes) = hotels::rate_hotel(state.store.pool(), id, score as i32)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(RateResponse {
        rating,
        rating_votes,
    }))
}

//! HTTP layer: route handlers, DTOs, and router composition.
//!
//! JSON endpoints are mounted under `/api`; the HTML page adapters live
//! at the root. The session middleware resolves the caller once per
//! request before any handler runs.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::session;

/// OpenAPI documentation for the easybook REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "easybook",
        version = "0.1.0",
        description = "Hotel reservation backend: bookings, waitlist notifications and presence admission.",
        license(name = "MIT"),
    ),
    tags(
        (name = "System", description = "Health check"),
        (name = "Auth", description = "Session status"),
        (name = "Hotels", description = "Hotel catalogue and rating"),
        (name = "Presence", description = "Hotel page admission"),
        (name = "Bookings", description = "Booking reservation engine"),
        (name = "Notifications", description = "Waitlist subscriptions and notifications"),
    ),
    paths(
        handlers::system::health_handler,
        handlers::auth::session_status_handler,
        handlers::hotels::list_hotels_handler,
        handlers::hotels::get_hotel_handler,
        handlers::hotels::create_hotel_handler,
        handlers::hotels::update_hotel_handler,
        handlers::hotels::delete_hotel_handler,
        handlers::hotels::rate_hotel_handler,
        handlers::presence::status_handler,
        handlers::presence::heartbeat_handler,
        handlers::bookings::availability_handler,
        handlers::bookings::list_bookings_handler,
        handlers::bookings::get_booking_handler,
        handlers::bookings::create_booking_handler,
        handlers::bookings::update_booking_handler,
        handlers::bookings::delete_booking_handler,
        handlers::bookings::booking_by_group_handler,
        handlers::notifications::subscribe_handler,
        handlers::notifications::list_notifications_handler,
        handlers::notifications::mark_read_handler,
        handlers::notifications::mark_all_read_handler,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::domain::pagination::PaginationMeta,
        crate::domain::user::CurrentUser,
        crate::domain::user::Role,
        crate::domain::waitlist::WaitlistKind,
        crate::service::presence::PresenceStatus,
        dto::auth_dto::SessionStatusResponse,
        dto::booking_dto::BookingWriteRequest,
        dto::booking_dto::BookingCreatedResponse,
        dto::booking_dto::AvailabilityResponse,
        dto::booking_dto::BookingItem,
        dto::booking_dto::BookingListResponse,
        dto::hotel_dto::HotelItem,
        dto::hotel_dto::HotelListResponse,
        dto::hotel_dto::HotelCreatedResponse,
        dto::hotel_dto::RateRequest,
        dto::hotel_dto::RateResponse,
        dto::notification_dto::SubscribeRequest,
        dto::notification_dto::SubscribeResponse,
        dto::notification_dto::NotificationItem,
        dto::notification_dto::NotificationListResponse,
        dto::notification_dto::ReadAllResponse,
    ))
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Builds the complete router: JSON API, HTML pages, session
/// middleware and the 404 fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", handlers::api_routes())
        .merge(handlers::pages::routes())
        .fallback(not_found_fallback)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session::attach_current_user,
        ))
        .with_state(state)
}

/// API paths get a JSON 404, everything else the HTML page.
async fn not_found_fallback(uri: Uri) -> axum::response::Response {
    if uri.path().starts_with("/api") {
        (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": "not_found" })),
        )
            .into_response()
    } else {
        handlers::pages::not_found_page()
    }
}

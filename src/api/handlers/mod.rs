//! Endpoint handlers organized by resource.

pub mod auth;
pub mod bookings;
pub mod hotels;
pub mod notifications;
pub mod pages;
pub mod presence;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all JSON API routes, nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(system::routes())
        .merge(auth::routes())
        .merge(hotels::routes())
        .merge(presence::routes())
        .merge(bookings::routes())
        .merge(notifications::routes())
}

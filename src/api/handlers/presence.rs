//! Presence status and heartbeat endpoints.
//!
//! Both endpoints are token/IP rate-limited per instance and work for
//! anonymous visitors; presence is scoped to the browser token, not the
//! account.

use std::net::SocketAddr;
use std::sync::LazyLock;

use axum::Json;
use axum::Router;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum_extra::extract::cookie::CookieJar;
use regex::Regex;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse};
use crate::service::PresenceStatus;
use crate::session::MaybeUser;

/// Name of the presence token cookie.
pub const PRESENCE_COOKIE: &str = "presence_token";

static PRESENCE_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .unwrap_or_else(|_| unreachable!())
});

/// Presence routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hotels/{id}/presence/status", get(status_handler))
        .route("/hotels/{id}/presence/heartbeat", post(heartbeat_handler))
}

/// `GET /api/hotels/{id}/presence/status` — Live occupancy for the
/// wait page's poll loop.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a malformed hotel id and
/// [`ApiError::RateLimited`] for over-eager pollers.
#[utoipa::path(
    get,
    path = "/api/hotels/{id}/presence/status",
    tag = "Presence",
    summary = "Presence occupancy for a hotel",
    params(("id" = Uuid, Path, description = "Hotel id")),
    responses(
        (status = 200, description = "Occupancy snapshot", body = PresenceStatus),
        (status = 429, description = "Polling too fast", body = ErrorResponse),
    )
)]
pub async fn status_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.presence.enabled() {
        return Ok(Json(PresenceStatus {
            active: 0,
            capacity: i64::from(state.presence.capacity()),
            can_enter: true,
        }));
    }

    let rate_key = format!("status:{id}:{}", client_key(&headers, addr));
    if !state.limiter.allow(&rate_key, state.presence.min_interval()) {
        return Err(ApiError::RateLimited);
    }

    let hotel_id = parse_hotel_id(&id)?;
    let status = state.presence.status(hotel_id).await?;
    Ok(Json(status))
}

/// `POST /api/hotels/{id}/presence/heartbeat` — Extend the caller's
/// lease. `ok:false` with `reason:"no_slot"` sends the client back
/// through the wait page.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a malformed hotel id and
/// [`ApiError::RateLimited`] for over-eager callers.
#[utoipa::path(
    post,
    path = "/api/hotels/{id}/presence/heartbeat",
    tag = "Presence",
    summary = "Renew the caller's presence lease",
    params(("id" = Uuid, Path, description = "Hotel id")),
    responses(
        (status = 200, description = "Lease verdict"),
        (status = 429, description = "Heartbeating too fast", body = ErrorResponse),
    )
)]
pub async fn heartbeat_handler(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.presence.enabled() {
        return Ok(Json(serde_json::json!({ "ok": true, "disabled": true })));
    }

    let Some(token) = read_presence_token(&jar) else {
        return Ok(Json(
            serde_json::json!({ "ok": false, "reason": "no_slot" }),
        ));
    };

    let rate_key = format!("heartbeat:{id}:{token}");
    if !state.limiter.allow(&rate_key, state.presence.min_interval()) {
        return Err(ApiError::RateLimited);
    }

    let hotel_id = parse_hotel_id(&id)?;
    let user_id = user.map(|user| user.id.to_string()).unwrap_or_default();
    let alive = state.presence.heartbeat(hotel_id, &token, &user_id).await?;

    if alive {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Ok(Json(
            serde_json::json!({ "ok": false, "reason": "no_slot" }),
        ))
    }
}

/// Reads and validates the presence token cookie.
#[must_use]
pub fn read_presence_token(jar: &CookieJar) -> Option<String> {
    let token = jar.get(PRESENCE_COOKIE)?.value().trim().to_lowercase();
    PRESENCE_TOKEN_PATTERN.is_match(&token).then_some(token)
}

/// Mints a presence token in the UUID shape the pattern expects.
#[must_use]
pub fn generate_presence_token() -> String {
    Uuid::new_v4().to_string()
}

fn parse_hotel_id(id: &str) -> Result<Uuid, ApiError> {
    id.trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid hotel id".to_string()))
}

/// Rate-limit key for anonymous status polls: the nearest proxy header
/// if present, the socket peer otherwise.
fn client_key(headers: &HeaderMap, addr: SocketAddr) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        && !real_ip.trim().is_empty()
    {
        return real_ip.trim().to_string();
    }

    addr.ip().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_match_the_cookie_pattern() {
        let token = generate_presence_token();
        assert!(PRESENCE_TOKEN_PATTERN.is_match(&token));
    }

    #[test]
    fn client_key_prefers_proxy_headers() {
        let addr: SocketAddr = "10.0.0.1:1234".parse().unwrap_or_else(|_| unreachable!());

        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, addr), "10.0.0.1");

        headers.insert("x-real-ip", "198.51.100.7".parse().unwrap_or_else(|_| unreachable!()));
        assert_eq!(client_key(&headers, addr), "198.51.100.7");

        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap_or_else(|_| unreachable!()),
        );
        assert_eq!(client_key(&headers, addr), "203.0.113.9");
    }
}

//! HTML page adapters: presence-gated hotel detail, the wait page and
//! the auth forms.
//!
//! Rendering is deliberately minimal — small inline documents around
//! the core flows. The interesting part is the admission gate on the
//! hotel detail page and the wait page's poll loop against the
//! presence status API.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::dto::auth_dto::{LoginForm, RegisterForm};
use crate::api::handlers::presence::{
    PRESENCE_COOKIE, generate_presence_token, read_presence_token,
};
use crate::app_state::AppState;
use crate::domain::validation::validate_register;
use crate::error::ApiError;
use crate::persistence::{hotels, is_unique_violation, users};
use crate::session::password::{hash_password, verify_password};
use crate::session::MaybeUser;

/// Page routes, mounted at the root.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_redirect))
        .route("/hotels", get(hotels_list_page))
        .route("/hotels/{id}", get(hotel_detail_page))
        .route("/hotel-wait", get(hotel_wait_page))
        .route("/bookings/new", get(new_booking_page))
        .route("/login", get(login_page).post(login_submit))
        .route("/register", get(register_page).post(register_submit))
        .route("/logout", post(logout_submit))
}

#[derive(Debug, Default, Deserialize)]
pub struct WaitPageQuery {
    #[serde(default, alias = "hotelId")]
    pub hotel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// `GET /` — The catalogue is the landing page.
pub async fn home_redirect() -> Redirect {
    Redirect::to("/hotels")
}

/// `GET /hotels` — Minimal catalogue listing linking into the gated
/// detail pages.
pub async fn hotels_list_page(State(state): State<AppState>) -> Result<Response, ApiError> {
    let items = hotels::list_hotels(
        state.store.pool(),
        &hotels::HotelFilter::default(),
        i64::from(state.config.hotels_page_max),
        0,
    )
    .await?;

    let listing = if items.is_empty() {
        "<p>No hotels yet.</p>".to_string()
    } else {
        items
            .iter()
            .map(|hotel| {
                format!(
                    "<li><a href=\"/hotels/{id}\">{title}</a> — {location}, {price:.2} per night</li>",
                    id = hotel.id,
                    title = escape_html(&hotel.title),
                    location = escape_html(&hotel.location),
                    price = hotel.price_per_night,
                )
            })
            .collect::<String>()
    };

    let body = format!("<h1>Hotels</h1>\n<ul>{listing}</ul>");
    Ok(page(StatusCode::OK, "Hotels", &body).into_response())
}

/// `GET /hotels/{id}` — Hotel detail, gated by presence admission.
/// A denied visitor is redirected to the wait page.
pub async fn hotel_detail_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let Ok(hotel_id) = id.trim().parse::<Uuid>() else {
        return Ok(not_found_page());
    };
    let Some(hotel) = hotels::find_hotel_by_id(state.store.pool(), hotel_id).await? else {
        return Ok(not_found_page());
    };

    let mut jar = jar;
    if state.presence.enabled() {
        let (next_jar, token) = ensure_presence_token(&state, jar);
        jar = next_jar;

        let user_id = user
            .as_ref()
            .map(|user| user.id.to_string())
            .unwrap_or_default();
        let (granted, _slot) = state.presence.acquire(hotel_id, &token, &user_id).await?;
        if !granted {
            let target = format!("/hotel-wait?hotelId={hotel_id}");
            return Ok((jar, Redirect::to(&target)).into_response());
        }
    }

    let amenities = hotel
        .amenities
        .iter()
        .map(|amenity| format!("<span class=\"chip\">{}</span>", escape_html(amenity)))
        .collect::<String>();
    let body = format!(
        r#"<h1>{title}</h1>
<p>{location} &middot; {address}</p>
<p>{description}</p>
<p><strong>{price:.2}</strong> per night &middot; rating {rating:.1}</p>
<div>{amenities}</div>
<p><a href="/bookings/new?hotelId={id}">Book this room</a></p>
<script>
  setInterval(function () {{
    fetch('/api/hotels/{id}/presence/heartbeat', {{ method: 'POST' }})
      .then(function (res) {{ return res.json(); }})
      .then(function (data) {{
        if (!data.ok) {{ window.location = '/hotel-wait?hotelId={id}'; }}
      }})
      .catch(function () {{}});
  }}, {heartbeat_ms});
</script>"#,
        title = escape_html(&hotel.title),
        location = escape_html(&hotel.location),
        address = escape_html(&hotel.address),
        description = escape_html(&hotel.description),
        price = hotel.price_per_night,
        rating = hotel.rating,
        amenities = amenities,
        id = hotel_id,
        heartbeat_ms = state.presence.min_interval().as_millis().max(2000),
    );

    Ok((jar, page(StatusCode::OK, &hotel.title, &body)).into_response())
}

/// `GET /hotel-wait?hotelId=` — Status page that polls the presence
/// API and retries the detail page once a slot frees up.
pub async fn hotel_wait_page(
    State(state): State<AppState>,
    Query(query): Query<WaitPageQuery>,
) -> Result<Response, ApiError> {
    let Some(hotel_id) = query
        .hotel_id
        .as_deref()
        .and_then(|id| id.trim().parse::<Uuid>().ok())
    else {
        return Ok(not_found_page());
    };

    if !state.presence.enabled() {
        let target = format!("/hotels/{hotel_id}");
        return Ok(Redirect::to(&target).into_response());
    }

    let Some(hotel) = hotels::find_hotel_by_id(state.store.pool(), hotel_id).await? else {
        return Ok(not_found_page());
    };
    let status = state.presence.status(hotel_id).await?;

    let body = format!(
        r#"<h1>Waiting for a free viewing slot</h1>
<p>{title} is currently viewed by {active} of {capacity} visitors.</p>
<p id="status">Checking again shortly&hellip;</p>
<script>
  function poll() {{
    fetch('/api/hotels/{id}/presence/status')
      .then(function (res) {{ return res.json(); }})
      .then(function (data) {{
        if (data.can_enter) {{ window.location = '/hotels/{id}'; return; }}
        document.getElementById('status').textContent =
          data.active + ' of ' + data.capacity + ' slots busy';
      }})
      .catch(function () {{}});
  }}
  setInterval(poll, 4000);
</script>"#,
        title = escape_html(&hotel.title),
        active = status.active,
        capacity = status.capacity,
        id = hotel_id,
    );

    Ok(page(StatusCode::OK, "Please wait", &body).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct NewBookingQuery {
    #[serde(default, alias = "hotelId")]
    pub hotel_id: Option<String>,
    #[serde(default, alias = "checkIn")]
    pub check_in: Option<String>,
    #[serde(default, alias = "checkOut")]
    pub check_out: Option<String>,
    #[serde(default, alias = "groupId")]
    pub group_id: Option<String>,
}

/// `GET /bookings/new` — Prefilled booking form. This is the page
/// notification links land on; the group id rides along so a priority
/// winner's booking is linked back to their subscription.
pub async fn new_booking_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<NewBookingQuery>,
) -> Result<Response, ApiError> {
    if user.is_none() {
        let next = format!(
            "/bookings/new?hotelId={}&checkIn={}&checkOut={}&groupId={}",
            query.hotel_id.as_deref().unwrap_or(""),
            query.check_in.as_deref().unwrap_or(""),
            query.check_out.as_deref().unwrap_or(""),
            query.group_id.as_deref().unwrap_or(""),
        );
        let target = format!("/login?next={}", urlencode(&next));
        return Ok(Redirect::to(&target).into_response());
    }

    let hotel_title = match query
        .hotel_id
        .as_deref()
        .and_then(|id| id.trim().parse::<Uuid>().ok())
    {
        Some(hotel_id) => hotels::find_hotel_by_id(state.store.pool(), hotel_id)
            .await?
            .map(|hotel| hotel.title),
        None => None,
    };

    let body = format!(
        r#"<h1>New booking</h1>
<p>{title}</p>
<form id="booking-form">
  <input type="hidden" name="room_id" value="{room}"/>
  <input type="hidden" name="group_id" value="{group}"/>
  <label>Check-in <input type="date" name="check_in" value="{check_in}" required/></label>
  <label>Check-out <input type="date" name="check_out" value="{check_out}" required/></label>
  <label>Guests <input type="number" name="guests" value="1" min="1" max="10" required/></label>
  <label>Notes <textarea name="notes" maxlength="400"></textarea></label>
  <button type="submit">Book</button>
</form>
<p id="result"></p>
<script>
  document.getElementById('booking-form').addEventListener('submit', function (event) {{
    event.preventDefault();
    var data = Object.fromEntries(new FormData(event.target).entries());
    fetch('/api/bookings', {{
      method: 'POST',
      headers: {{ 'Content-Type': 'application/json' }},
      body: JSON.stringify(data)
    }})
      .then(function (res) {{ return res.json().then(function (body) {{ return {{ ok: res.ok, body: body }}; }}); }})
      .then(function (out) {{
        document.getElementById('result').textContent = out.ok
          ? 'Booked! Reference ' + out.body._id
          : (out.body.message || out.body.error || 'Booking failed');
      }});
  }});
</script>"#,
        title = escape_html(hotel_title.as_deref().unwrap_or("Selected hotel")),
        room = escape_html(query.hotel_id.as_deref().unwrap_or("")),
        group = escape_html(query.group_id.as_deref().unwrap_or("")),
        check_in = escape_html(query.check_in.as_deref().unwrap_or("")),
        check_out = escape_html(query.check_out.as_deref().unwrap_or("")),
    );

    Ok(page(StatusCode::OK, "New booking", &body).into_response())
}

/// `GET /login` — Login form; an authenticated caller is bounced to
/// `next`.
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_redirect_path(query.next.as_deref(), "/hotels");
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }
    login_form(StatusCode::OK, &next, "", "").into_response()
}

/// `POST /login` — Verify credentials and start a session.
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response, ApiError> {
    let email = form.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = form.password.as_deref().unwrap_or("").trim();
    let next = safe_redirect_path(form.next.as_deref(), "/hotels");

    if email.is_empty() || password.is_empty() {
        return Ok(login_form(StatusCode::UNAUTHORIZED, &next, &email, "Invalid credentials")
            .into_response());
    }

    let Some(user) = users::find_user_by_email(state.store.pool(), &email).await? else {
        return Ok(login_form(StatusCode::UNAUTHORIZED, &next, &email, "Invalid credentials")
            .into_response());
    };
    if !verify_password(password, &user.password_hash) {
        return Ok(login_form(StatusCode::UNAUTHORIZED, &next, &email, "Invalid credentials")
            .into_response());
    }

    let jar = state
        .sessions
        .start_session(
            jar,
            user.id,
            &user.email,
            crate::domain::Role::from_str_or_user(&user.role),
        )
        .await?;
    Ok((jar, Redirect::to(&next)).into_response())
}

/// `GET /register` — Registration form.
pub async fn register_page(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_redirect_path(query.next.as_deref(), "/hotels");
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }
    register_form(StatusCode::OK, &next, "", "").into_response()
}

/// `POST /register` — Create an account and start a session.
pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Result<Response, ApiError> {
    let next = safe_redirect_path(form.next.as_deref(), "/hotels");
    let email_value = form.email.as_deref().unwrap_or("").trim().to_lowercase();
    let terms = matches!(form.terms.as_deref().map(str::trim), Some("on" | "true"));

    let draft = match validate_register(
        form.email.as_deref(),
        form.password.as_deref(),
        form.confirm_password.as_deref(),
        terms,
    ) {
        Ok(draft) => draft,
        Err(problems) => {
            let message = problems
                .into_iter()
                .next()
                .unwrap_or_else(|| "Invalid registration".to_string());
            return Ok(
                register_form(StatusCode::BAD_REQUEST, &next, &email_value, &message)
                    .into_response(),
            );
        }
    };

    if users::find_user_by_email(state.store.pool(), &draft.email)
        .await?
        .is_some()
    {
        return Ok(register_form(
            StatusCode::CONFLICT,
            &next,
            &email_value,
            "Email is already used",
        )
        .into_response());
    }

    let password_hash = hash_password(&draft.password)?;
    let user_id =
        match users::insert_user(state.store.pool(), &draft.email, &password_hash, "user").await {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err, "users_email") => {
                return Ok(register_form(
                    StatusCode::CONFLICT,
                    &next,
                    &email_value,
                    "Email is already used",
                )
                .into_response());
            }
            Err(err) => return Err(err.into()),
        };

    let jar = state
        .sessions
        .start_session(jar, user_id, &draft.email, crate::domain::Role::User)
        .await?;
    Ok((jar, Redirect::to(&next)).into_response())
}

/// `POST /logout` — Destroy the session, if any, and clear the cookie.
pub async fn logout_submit(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let jar = state.sessions.destroy_session(jar).await?;
    Ok((jar, Redirect::to("/login")).into_response())
}

/// Returns the existing presence token or mints one and sets the
/// cookie. The cookie outlives the lease by a wide margin so a waiting
/// visitor keeps their identity across polls.
fn ensure_presence_token(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    if let Some(token) = read_presence_token(&jar) {
        return (jar, token);
    }

    let token = generate_presence_token();
    let max_age_secs = (state_ttl_secs(state) * 20).clamp(300, 86_400);
    let cookie = Cookie::build((PRESENCE_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.is_production())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .build();

    (jar.add(cookie), token)
}

fn state_ttl_secs(state: &AppState) -> u64 {
    state.config.presence_ttl_seconds.max(1)
}

/// Only same-site absolute paths are accepted as post-auth redirects.
fn safe_redirect_path(next: Option<&str>, fallback: &str) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => fallback.to_string(),
    }
}

fn login_form(status: StatusCode, next: &str, email: &str, error: &str) -> Response {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error\">{}</p>", escape_html(error))
    };
    let body = format!(
        r#"<h1>Sign in</h1>
{error_html}
<form method="POST" action="/login">
  <input type="hidden" name="next" value="{next}"/>
  <label>Email <input type="email" name="email" value="{email}" required/></label>
  <label>Password <input type="password" name="password" required/></label>
  <button type="submit">Sign in</button>
</form>
<p><a href="/register">Create an account</a></p>"#,
        error_html = error_html,
        next = escape_html(next),
        email = escape_html(email),
    );
    page(status, "Sign in", &body).into_response()
}

fn register_form(status: StatusCode, next: &str, email: &str, error: &str) -> Response {
    let error_html = if error.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error\">{}</p>", escape_html(error))
    };
    let body = format!(
        r#"<h1>Create an account</h1>
{error_html}
<form method="POST" action="/register">
  <input type="hidden" name="next" value="{next}"/>
  <label>Email <input type="email" name="email" value="{email}" required/></label>
  <label>Password <input type="password" name="password" required/></label>
  <label>Confirm password <input type="password" name="confirmPassword" required/></label>
  <label><input type="checkbox" name="terms"/> I accept the terms</label>
  <button type="submit">Register</button>
</form>"#,
        error_html = error_html,
        next = escape_html(next),
        email = escape_html(email),
    );
    page(status, "Register", &body).into_response()
}

/// Shared 404 page.
#[must_use]
pub fn not_found_page() -> Response {
    page(
        StatusCode::NOT_FOUND,
        "Not found",
        "<h1>Page not found</h1><p><a href=\"/hotels\">Back to hotels</a></p>",
    )
    .into_response()
}

fn page(status: StatusCode, title: &str, body: &str) -> (StatusCode, Html<String>) {
    let html = format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>{title} — easybook</title>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape_html(title),
        body = body,
    );
    (status, Html(html))
}

/// Percent-encodes a query-string value.
fn urlencode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Minimal HTML escaping for interpolated user content.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_paths_must_be_same_site() {
        assert_eq!(safe_redirect_path(Some("/bookings"), "/x"), "/bookings");
        assert_eq!(safe_redirect_path(Some("//evil.example"), "/x"), "/x");
        assert_eq!(safe_redirect_path(Some("https://evil.example"), "/x"), "/x");
        assert_eq!(safe_redirect_path(None, "/x"), "/x");
    }

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }
}

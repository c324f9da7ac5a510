//! Session and authorization gate.
//!
//! Sessions are random 256-bit tokens persisted in the store with an
//! expiry. The cookie carries `token.signature` where the signature is
//! HMAC-SHA256 over the token with the deployment secret; verification
//! is constant-time, so the cookie boundary never leaks timing about
//! valid tokens. [`CurrentUser`] is attached to request extensions by
//! [`attach_current_user`] and consumed through the extractors below.

pub mod password;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::domain::{CurrentUser, Role};
use crate::error::ApiError;
use crate::persistence::{Store, sessions};

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "easybook.sid";

/// Session lifetime.
const SESSION_TTL_HOURS: i64 = 24;

/// Signs and verifies `token.signature` cookie values.
///
/// Split from the manager so the codec is testable without a store.
#[derive(Clone)]
pub struct CookieCodec {
    mac: HmacSha256,
}

impl CookieCodec {
    /// Builds a codec from the session secret.
    ///
    /// # Errors
    ///
    /// Returns a message when the secret is shorter than 12 characters.
    pub fn new(secret: &str) -> Result<Self, String> {
        if secret.len() < 12 {
            return Err("session secret must be at least 12 characters".to_string());
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|err| format!("session secret rejected: {err}"))?;
        Ok(Self { mac })
    }

    /// Encodes a token into the cookie value `token.signature`.
    #[must_use]
    pub fn encode(&self, token: &str) -> String {
        format!("{token}.{}", self.sign(token))
    }

    /// Decodes and verifies a cookie value, returning the token.
    ///
    /// Returns `None` for malformed values or bad signatures; the
    /// comparison is constant-time.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<String> {
        let (token, signature) = value.split_once('.')?;
        let token = token.trim();
        let signature = signature.trim();
        if token.is_empty() || signature.is_empty() {
            return None;
        }

        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(token.to_string())
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

/// Store-backed session manager.
pub struct SessionManager {
    store: Store,
    codec: CookieCodec,
    secure: bool,
}

impl SessionManager {
    /// Creates the manager.
    ///
    /// # Errors
    ///
    /// Returns a message when the secret fails the codec policy.
    pub fn new(store: Store, secure: bool, secret: &str) -> Result<Self, String> {
        Ok(Self {
            store,
            codec: CookieCodec::new(secret)?,
            secure,
        })
    }

    /// Starts a session for the user, replacing any session the cookie
    /// previously pointed at. Returns the jar with the new cookie set.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn start_session(
        &self,
        jar: CookieJar,
        user_id: Uuid,
        email: &str,
        role: Role,
    ) -> Result<CookieJar, ApiError> {
        if let Some(existing) = jar.get(SESSION_COOKIE)
            && let Some(token) = self.codec.decode(existing.value())
        {
            sessions::delete_session(self.store.pool(), &token).await?;
        }

        let token = generate_token();
        let expires_at = Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS);
        sessions::insert_session(
            self.store.pool(),
            &token,
            user_id,
            email,
            role.as_str(),
            expires_at,
        )
        .await?;

        let cookie = Cookie::build((SESSION_COOKIE, self.codec.encode(&token)))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(SESSION_TTL_HOURS))
            .build();

        Ok(jar.add(cookie))
    }

    /// Destroys the session the cookie points at and clears the cookie.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn destroy_session(&self, jar: CookieJar) -> Result<CookieJar, ApiError> {
        if let Some(existing) = jar.get(SESSION_COOKIE)
            && let Some(token) = self.codec.decode(existing.value())
        {
            sessions::delete_session(self.store.pool(), &token).await?;
        }

        let removal = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();

        Ok(jar.remove(removal))
    }

    /// Resolves the caller from the session cookie, deleting expired
    /// rows on sight. Any failure resolves to anonymous.
    pub async fn load_user(&self, jar: &CookieJar) -> Option<CurrentUser> {
        let cookie = jar.get(SESSION_COOKIE)?;
        let token = self.codec.decode(cookie.value())?;

        let row = sessions::find_session(self.store.pool(), &token)
            .await
            .ok()??;

        if row.expires_at <= Utc::now() {
            let _ = sessions::delete_session(self.store.pool(), &token).await;
            return None;
        }

        Some(CurrentUser {
            id: row.user_id,
            email: row.email,
            role: Role::from_str_or_user(&row.role),
        })
    }
}

/// Mints a 256-bit URL-safe session token.
#[must_use]
pub fn generate_token() -> String {
    let mut buffer = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

/// Middleware: resolves the caller once per request and stashes the
/// result in request extensions for the extractors.
pub async fn attach_current_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = state.sessions.load_user(&jar).await;
    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}

/// The caller, if authenticated. Always succeeds.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<MaybeUser>()
            .cloned()
            .unwrap_or(Self(None)))
    }
}

/// The caller, required. Rejects with 401 when anonymous.
#[derive(Debug, Clone)]
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<MaybeUser>()
            .and_then(|user| user.0.clone())
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}

/// The caller, required to be an admin. Rejects with 401 when
/// anonymous and 403 otherwise.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CookieCodec {
        let Ok(codec) = CookieCodec::new("test-session-secret-123") else {
            panic!("valid secret");
        };
        codec
    }

    #[test]
    fn rejects_short_secrets() {
        assert!(CookieCodec::new("short").is_err());
        assert!(CookieCodec::new("long-enough-secret").is_ok());
    }

    #[test]
    fn round_trips_tokens() {
        let codec = codec();
        let token = generate_token();
        let value = codec.encode(&token);
        assert_eq!(codec.decode(&value), Some(token));
    }

    #[test]
    fn rejects_tampered_values() {
        let codec = codec();
        let token = generate_token();
        let value = codec.encode(&token);

        // Flip the token part: the signature no longer matches.
        let forged = format!("x{}", &value[1..]);
        assert_eq!(codec.decode(&forged), None);

        // Truncate the signature.
        let truncated = &value[..value.len() - 2];
        assert_eq!(codec.decode(truncated), None);

        // A token signed with a different secret is rejected.
        let Ok(other) = CookieCodec::new("another-secret-456") else {
            panic!("valid secret");
        };
        assert_eq!(codec.decode(&other.encode(&token)), None);
    }

    #[test]
    fn rejects_malformed_values() {
        let codec = codec();
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("no-separator"), None);
        assert_eq!(codec.decode(".sig-only"), None);
        assert_eq!(codec.decode("token."), None);
        assert_eq!(codec.decode("token.!!not-base64!!"), None);
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        assert!(first.len() >= 43);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}

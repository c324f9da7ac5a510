//! Application error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type. Each variant maps to a
//! specific HTTP status and a stable machine-readable error code in the
//! JSON response body. Store duplicate-key errors are translated into
//! the conflict variants at the persistence boundary and never reach
//! this layer raw.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": "booking_conflict",
///   "message": "Room is already booked for selected dates"
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request payload failed shape or range validation.
    #[error("{0}")]
    Validation(String),

    /// Target row does not exist.
    #[error("not found")]
    NotFound,

    /// Caller is authenticated but not the owner or an admin.
    #[error("forbidden")]
    Forbidden,

    /// Missing or invalid session.
    #[error("authentication required")]
    Unauthorized,

    /// Calendar ledger admission failed: the room is taken for at least
    /// one requested night.
    #[error("room is already booked for selected dates")]
    BookingConflict,

    /// Caller already holds an active subscription for this tuple.
    #[error("duplicate waitlist subscription")]
    DuplicateWaitlist,

    /// An active priority subscription already exists for this tuple.
    #[error("priority waitlist already taken")]
    PriorityAlreadyTaken,

    /// Presence status/heartbeat calls arrived faster than the
    /// configured minimum interval.
    #[error("too many requests")]
    RateLimited,

    /// Store failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the stable error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::BookingConflict => "booking_conflict",
            Self::DuplicateWaitlist => "duplicate_subscription",
            Self::PriorityAlreadyTaken => "priority_taken",
            Self::RateLimited => "rate_limited",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BookingConflict | Self::DuplicateWaitlist | Self::PriorityAlreadyTaken => {
                StatusCode::CONFLICT
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal failures are logged with detail and answered with an
        // opaque body.
        let message = match &self {
            Self::Database(err) => {
                tracing::error!(error = %err, "store failure");
                None
            }
            Self::Internal(detail) => {
                tracing::error!(detail, "internal error");
                None
            }
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message,
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_variants_map_to_409() {
        assert_eq!(ApiError::BookingConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::DuplicateWaitlist.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::PriorityAlreadyTaken.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ApiError::BookingConflict.error_code(), "booking_conflict");
        assert_eq!(
            ApiError::DuplicateWaitlist.error_code(),
            "duplicate_subscription"
        );
        assert_eq!(
            ApiError::PriorityAlreadyTaken.error_code(),
            "priority_taken"
        );
        assert_eq!(ApiError::RateLimited.error_code(), "rate_limited");
        assert_eq!(
            ApiError::Validation("bad".into()).error_code(),
            "validation_error"
        );
    }
}

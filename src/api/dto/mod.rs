//! Request and response DTOs for the JSON API, organized by resource.
//!
//! The wire format keeps the field names the clients already speak:
//! dates are `YYYY-MM-DD` strings, timestamps RFC3339 UTC, ids UUIDs.
//! Write requests accept the legacy camelCase aliases alongside the
//! canonical snake_case names.

pub mod auth_dto;
pub mod booking_dto;
pub mod hotel_dto;
pub mod notification_dto;

//! Booking request/response DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pagination::PaginationMeta;
use crate::persistence::bookings::{BookingDetails, BookingRow};

/// Body of `POST /api/bookings` and `PUT /api/bookings/:id`.
///
/// Fields arrive loosely typed so validation can answer with the exact
/// problem instead of a generic deserialization error; guests accepts a
/// number or a numeric string, decoded losslessly.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct BookingWriteRequest {
    /// Room (hotel) id.
    #[serde(default, alias = "roomId", alias = "hotelId")]
    pub room_id: Option<String>,
    /// Check-in date, `YYYY-MM-DD`.
    #[serde(default, alias = "checkIn")]
    pub check_in: Option<String>,
    /// Check-out date, `YYYY-MM-DD`.
    #[serde(default, alias = "checkOut")]
    pub check_out: Option<String>,
    /// Guest count, 1–10.
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub guests: Option<serde_json::Value>,
    /// Free-form notes, at most 400 characters.
    #[serde(default)]
    pub notes: Option<String>,
    /// Group id linking a priority-waitlist winner to this booking.
    #[serde(default, alias = "groupId")]
    pub group_id: Option<String>,
}

/// Query of `GET /api/bookings/availability`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct AvailabilityQuery {
    #[serde(default, alias = "roomId", alias = "hotelId")]
    pub room_id: Option<String>,
    #[serde(default, alias = "checkIn")]
    pub check_in: Option<String>,
    #[serde(default, alias = "checkOut")]
    pub check_out: Option<String>,
    #[serde(default, alias = "excludeBookingId")]
    pub exclude_booking_id: Option<String>,
}

/// Query of `GET /api/bookings`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct BookingListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `mine` (default) or `all`; `all` requires the admin role.
    pub scope: Option<String>,
    #[serde(default, alias = "roomId", alias = "hotelId")]
    pub room_id: Option<String>,
}

/// Response of `POST /api/bookings`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BookingCreatedResponse {
    /// Id of the new booking.
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// Availability preflight result.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A booking as returned by the list/detail endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BookingItem {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "roomId")]
    pub room_id: Uuid,
    /// Mirror of `roomId`, kept for clients predating the rename.
    #[serde(rename = "hotelId")]
    pub hotel_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "checkIn")]
    pub check_in: NaiveDate,
    #[serde(rename = "checkOut")]
    pub check_out: NaiveDate,
    pub guests: i32,
    pub notes: String,
    pub status: String,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "hotelTitle", skip_serializing_if = "Option::is_none")]
    pub hotel_title: Option<String>,
    #[serde(rename = "hotelLocation", skip_serializing_if = "Option::is_none")]
    pub hotel_location: Option<String>,
    #[serde(rename = "userEmail", skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl From<BookingDetails> for BookingItem {
    fn from(row: BookingDetails) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            hotel_id: row.room_id,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            notes: row.notes,
            status: row.status,
            group_id: row.group_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            hotel_title: row.hotel_title,
            hotel_location: row.hotel_location,
            user_email: row.user_email,
        }
    }
}

impl From<BookingRow> for BookingItem {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            hotel_id: row.room_id,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            notes: row.notes,
            status: row.status,
            group_id: row.group_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            hotel_title: None,
            hotel_location: None,
            user_email: None,
        }
    }
}

/// Response of `GET /api/bookings`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BookingListResponse {
    pub items: Vec<BookingItem>,
    pub meta: PaginationMeta,
}

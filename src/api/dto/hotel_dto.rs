//! Hotel DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pagination::PaginationMeta;
use crate::persistence::hotels::HotelRow;

/// Query of `GET /api/hotels`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct HotelListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Substring match on title or location.
    pub q: Option<String>,
    /// Exact city filter.
    pub city: Option<String>,
}

/// One hotel.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HotelItem {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub address: String,
    pub price_per_night: f64,
    pub rating: f64,
    #[serde(rename = "ratingVotes")]
    pub rating_votes: i32,
    pub available_rooms: i32,
    pub amenities: Vec<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<HotelRow> for HotelItem {
    fn from(row: HotelRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            address: row.address,
            price_per_night: row.price_per_night,
            rating: row.rating,
            rating_votes: row.rating_votes,
            available_rooms: row.available_rooms,
            amenities: row.amenities,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Response of `GET /api/hotels`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HotelListResponse {
    pub items: Vec<HotelItem>,
    pub meta: PaginationMeta,
    /// Distinct cities for the filter dropdown.
    pub cities: Vec<String>,
}

/// Response of `POST /api/hotels`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HotelCreatedResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// Body of `POST /api/hotels/:id/rate`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct RateRequest {
    /// Score, 1–5.
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub rating: Option<serde_json::Value>,
}

/// Response of `POST /api/hotels/:id/rate`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RateResponse {
    pub rating: f64,
    #[serde(rename = "ratingVotes")]
    pub rating_votes: i32,
}

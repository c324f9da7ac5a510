//! Hotel rows: plain CRUD plus the rating accumulator.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::validation::HotelDraft;

/// A hotel row. The whole hotel is treated as one bookable room.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HotelRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub address: String,
    pub price_per_night: f64,
    pub rating: f64,
    pub rating_votes: i32,
    pub rating_total: f64,
    pub available_rooms: i32,
    pub amenities: Vec<String>,
    pub image_url: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for hotel listings: substring match on title/location plus an
/// exact city.
#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    pub query: Option<String>,
    pub city: Option<String>,
}

/// Loads one hotel.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_hotel_by_id(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<HotelRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM hotels WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Returns `true` if the hotel exists. Used by the booking and waitlist
/// engines to validate room references.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn hotel_exists(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM hotels WHERE id = $1)")
        .bind(id)
        .fetch_one(executor)
        .await
}

/// Lists hotels ordered by title.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn list_hotels(
    executor: impl PgExecutor<'_>,
    filter: &HotelFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<HotelRow>, sqlx::Error> {
    let pattern = filter.query.as_deref().map(like_pattern);
    sqlx::query_as(
        "SELECT * FROM hotels
         WHERE ($1::text IS NULL OR title ILIKE $1 OR location ILIKE $1)
           AND ($2::text IS NULL OR location = $2)
         ORDER BY title ASC
         LIMIT $3 OFFSET $4",
    )
    .bind(pattern)
    .bind(filter.city.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Counts hotels matching the filter.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn count_hotels(
    executor: impl PgExecutor<'_>,
    filter: &HotelFilter,
) -> Result<i64, sqlx::Error> {
    let pattern = filter.query.as_deref().map(like_pattern);
    sqlx::query_scalar(
        "SELECT count(*) FROM hotels
         WHERE ($1::text IS NULL OR title ILIKE $1 OR location ILIKE $1)
           AND ($2::text IS NULL OR location = $2)",
    )
    .bind(pattern)
    .bind(filter.city.as_deref())
    .fetch_one(executor)
    .await
}

/// Lists the distinct cities hotels are registered in, sorted.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn distinct_cities(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT location FROM hotels WHERE location <> '' ORDER BY location ASC",
    )
    .fetch_all(executor)
    .await
}

/// Inserts a hotel from a fully-validated draft, returning the new id.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn insert_hotel(
    executor: impl PgExecutor<'_>,
    draft: &HotelDraft,
    created_by: Uuid,
) -> Result<Uuid, sqlx::Error> {
    let rating = draft.rating.unwrap_or(0.0);
    sqlx::query_scalar(
        "INSERT INTO hotels
             (title, description, location, address, price_per_night, rating,
              rating_votes, rating_total, available_rooms, amenities, image_url, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, 0, $6, $7, $8, $9, $10)
         RETURNING id",
    )
    .bind(draft.title.as_deref().unwrap_or_default())
    .bind(draft.description.as_deref().unwrap_or_default())
    .bind(draft.location.as_deref().unwrap_or_default())
    .bind(draft.address.as_deref().unwrap_or_default())
    .bind(draft.price_per_night.unwrap_or_default())
    .bind(rating)
    .bind(draft.available_rooms.unwrap_or_default())
    .bind(draft.amenities.clone().unwrap_or_default())
    .bind(draft.image_url.as_deref().unwrap_or_default())
    .bind(created_by)
    .fetch_one(executor)
    .await
}

/// Applies the provided fields of a partial draft, returning whether a
/// row matched.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn update_hotel(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    draft: &HotelDraft,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE hotels SET
             title = COALESCE($2, title),
             description = COALESCE($3, description),
             location = COALESCE($4, location),
             address = COALESCE($5, address),
             price_per_night = COALESCE($6, price_per_night),
             rating = COALESCE($7, rating),
             available_rooms = COALESCE($8, available_rooms),
             amenities = COALESCE($9, amenities),
             image_url = COALESCE($10, image_url),
             updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(draft.title.as_deref())
    .bind(draft.description.as_deref())
    .bind(draft.location.as_deref())
    .bind(draft.address.as_deref())
    .bind(draft.price_per_night)
    .bind(draft.rating)
    .bind(draft.available_rooms)
    .bind(draft.amenities.as_deref())
    .bind(draft.image_url.as_deref())
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a hotel, returning whether it existed.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn delete_hotel(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM hotels WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Folds one rating vote into the accumulator and recomputes the
/// one-decimal average in a single statement, so concurrent votes never
/// lose updates. Legacy rows without votes seed the accumulator from
/// the displayed rating.
///
/// Returns the new `(rating, votes)` pair, or `None` for a missing
/// hotel.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn rate_hotel(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    score: i32,
) -> Result<Option<(f64, i32)>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE hotels SET
             rating_total = CASE WHEN rating_total <= 0 THEN rating ELSE rating_total END + $2,
             rating_votes = GREATEST(rating_votes, 1) + 1,
             rating = round(
                 (((CASE WHEN rating_total <= 0 THEN rating ELSE rating_total END + $2)
                   / (GREATEST(rating_votes, 1) + 1))::numeric),
                 1
             )::double precision,
             updated_at = now()
         WHERE id = $1
         RETURNING rating, rating_votes",
    )
    .bind(id)
    .bind(f64::from(score))
    .fetch_optional(executor)
    .await
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

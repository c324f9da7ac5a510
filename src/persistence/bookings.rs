//! Booking rows and the room-calendar ledger.
//!
//! The ledger is the authoritative admission gate: one row per
//! (room, night) with a unique index on the pair. Reserving a stay is a
//! single multi-row insert, so two concurrent writers racing for the
//! same night serialize on the index and exactly one wins.
//!
//! Functions take any `PgExecutor` so the engine can run them inside
//! one transaction (create/update paths) or straight on the pool
//! (availability preflight, waitlist rechecks).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A booking row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub notes: String,
    pub status: String,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking row joined with hotel and owner details for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub notes: String,
    pub status: String,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub hotel_title: Option<String>,
    pub hotel_location: Option<String>,
    pub user_email: Option<String>,
}

/// Filter for booking listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    /// Restrict to a single owner (always set for non-admin callers).
    pub user_id: Option<Uuid>,
    /// Restrict to a single room.
    pub room_id: Option<Uuid>,
}

const DETAILS_COLUMNS: &str = "b.id, b.user_id, b.room_id, b.check_in, b.check_out, b.guests, \
     b.notes, b.status, b.group_id, b.created_at, b.updated_at, \
     h.title AS hotel_title, h.location AS hotel_location, u.email AS user_email";

/// Returns `true` if any requested night is already held in the ledger
/// by a booking other than `exclude`.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn conflict_exists(
    executor: impl PgExecutor<'_>,
    room_id: Uuid,
    days: &[NaiveDate],
    exclude: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    if days.is_empty() {
        return Ok(false);
    }

    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM room_calendar
             WHERE room_id = $1
               AND day = ANY($2)
               AND ($3::uuid IS NULL OR booking_id <> $3)
         )",
    )
    .bind(room_id)
    .bind(days)
    .bind(exclude)
    .fetch_one(executor)
    .await
}

/// Inserts one ledger row per night in a single batch. A collision on
/// any night fails the whole batch with a unique violation on
/// `room_calendar_room_day_unique`, which the engine maps to
/// `BookingConflict`.
///
/// # Errors
///
/// Returns the underlying store error, including the unique violation.
pub async fn reserve_nights(
    executor: impl PgExecutor<'_>,
    room_id: Uuid,
    booking_id: Uuid,
    days: &[NaiveDate],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO room_calendar (room_id, day, booking_id)
         SELECT $1, day, $2 FROM unnest($3::date[]) AS day",
    )
    .bind(room_id)
    .bind(booking_id)
    .bind(days)
    .execute(executor)
    .await?;
    Ok(())
}

/// Deletes every ledger row owned by the booking.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn release_nights(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_calendar WHERE booking_id = $1")
        .bind(booking_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Inserts a confirmed booking row.
///
/// # Errors
///
/// Returns the underlying store error.
#[allow(clippy::too_many_arguments)]
pub async fn insert_booking(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    notes: &str,
    group_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO bookings
             (id, user_id, room_id, check_in, check_out, guests, notes, status, group_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'confirmed', $8)",
    )
    .bind(id)
    .bind(user_id)
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .bind(guests)
    .bind(notes)
    .bind(group_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Loads a booking row, locking it for the rest of the transaction so
/// concurrent updates of the same booking serialize.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_booking_for_update(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Overwrites the mutable columns of a booking. Status is forced back
/// to `confirmed`; background jobs never mutate bookings.
///
/// # Errors
///
/// Returns the underlying store error.
#[allow(clippy::too_many_arguments)]
pub async fn update_booking_row(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    notes: &str,
    group_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bookings
         SET room_id = $2, check_in = $3, check_out = $4, guests = $5, notes = $6,
             group_id = $7, status = 'confirmed', updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .bind(guests)
    .bind(notes)
    .bind(group_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Deletes a booking row, returning whether it existed.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn delete_booking_row(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Loads a booking with hotel and owner details.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_booking_details(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<BookingDetails>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {DETAILS_COLUMNS}
         FROM bookings b
         LEFT JOIN hotels h ON h.id = b.room_id
         LEFT JOIN users u ON u.id = b.user_id
         WHERE b.id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Lists bookings with details, newest first.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn list_bookings(
    executor: impl PgExecutor<'_>,
    filter: BookingFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<BookingDetails>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {DETAILS_COLUMNS}
         FROM bookings b
         LEFT JOIN hotels h ON h.id = b.room_id
         LEFT JOIN users u ON u.id = b.user_id
         WHERE ($1::uuid IS NULL OR b.user_id = $1)
           AND ($2::uuid IS NULL OR b.room_id = $2)
         ORDER BY b.created_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(filter.user_id)
    .bind(filter.room_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

/// Counts bookings matching the filter.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn count_bookings(
    executor: impl PgExecutor<'_>,
    filter: BookingFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT count(*) FROM bookings
         WHERE ($1::uuid IS NULL OR user_id = $1)
           AND ($2::uuid IS NULL OR room_id = $2)",
    )
    .bind(filter.user_id)
    .bind(filter.room_id)
    .fetch_one(executor)
    .await
}

/// Finds the caller's non-cancelled booking minted from a priority
/// waitlist group.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_booking_by_group_and_user(
    executor: impl PgExecutor<'_>,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM bookings
         WHERE group_id = $1 AND user_id = $2 AND status <> 'cancelled'
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

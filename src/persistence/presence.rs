//! Presence slot rows: TTL-leased admission to hotel detail pages.
//!
//! Each hotel has `capacity` slot positions; the unique
//! `(hotel_id, slot)` index makes a slot claim an atomic compare-and-
//! swap. Expired rows are reclaimed in the claim itself (the upsert's
//! `WHERE` clause) and swept by the background task; reads always
//! filter on `expires_at > now()`, so the capacity bound never depends
//! on the sweep.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Refreshes the lease on whichever slot this token already holds for
/// the hotel, returning the slot ordinal if one matched.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn refresh_own_slot(
    executor: impl PgExecutor<'_>,
    hotel_id: Uuid,
    token: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE hotel_presence
         SET expires_at = $3, user_id = $4, updated_at = now()
         WHERE hotel_id = $1 AND token = $2
         RETURNING slot",
    )
    .bind(hotel_id)
    .bind(token)
    .bind(expires_at)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Attempts to claim one slot position: insert the row, or take over an
/// existing row only if it is expired or already ours. Returns `true`
/// when the slot now carries this token.
///
/// A live row held by another token makes the upsert's `WHERE` clause
/// false; no row comes back and the caller moves to the next slot.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn try_claim_slot(
    executor: impl PgExecutor<'_>,
    hotel_id: Uuid,
    slot: i32,
    token: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let claimed: Option<String> = sqlx::query_scalar(
        "INSERT INTO hotel_presence (hotel_id, slot, token, user_id, expires_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (hotel_id, slot) DO UPDATE
         SET token = EXCLUDED.token,
             user_id = EXCLUDED.user_id,
             expires_at = EXCLUDED.expires_at,
             updated_at = now()
         WHERE hotel_presence.expires_at <= now()
            OR hotel_presence.token = EXCLUDED.token
         RETURNING token",
    )
    .bind(hotel_id)
    .bind(slot)
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .fetch_optional(executor)
    .await?;

    Ok(claimed.as_deref() == Some(token))
}

/// Extends a live lease. Returns `false` when the token holds no live
/// slot for the hotel (the caller must go back through admission).
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn extend_live_slot(
    executor: impl PgExecutor<'_>,
    hotel_id: Uuid,
    token: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE hotel_presence
         SET expires_at = $3, user_id = $4, updated_at = now()
         WHERE hotel_id = $1 AND token = $2 AND expires_at > now()",
    )
    .bind(hotel_id)
    .bind(token)
    .bind(expires_at)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Counts live leases within the configured slot range.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn count_live_slots(
    executor: impl PgExecutor<'_>,
    hotel_id: Uuid,
    capacity: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT count(*) FROM hotel_presence
         WHERE hotel_id = $1 AND expires_at > now() AND slot BETWEEN 1 AND $2",
    )
    .bind(hotel_id)
    .bind(capacity)
    .fetch_one(executor)
    .await
}

impl super::Store {
    /// Deletes expired presence rows. Called by the background sweep.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn delete_expired_presence(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hotel_presence WHERE expires_at <= now()")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

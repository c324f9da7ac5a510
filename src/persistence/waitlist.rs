//! Waitlist subscriptions and in-app notifications.
//!
//! Subscriptions are deactivated, never hard-deleted. Two partial
//! unique indexes guard the invariants: `waitlist_active_unique` (one
//! active subscription per user and tuple) and
//! `waitlist_priority_unique` (one active priority subscription per
//! tuple). Inserts race on them; the dispatcher maps the violations to
//! typed conflicts.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::WaitlistKind;

/// A waitlist subscription row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub kind: String,
    pub is_active: bool,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A notification row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub link: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Returns `true` if the caller already holds an active subscription
/// for this tuple.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn active_duplicate_exists(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM waitlist
             WHERE user_id = $1 AND room_id = $2
               AND check_in = $3 AND check_out = $4 AND is_active
         )",
    )
    .bind(user_id)
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_one(executor)
    .await
}

/// Returns `true` if any active priority subscription exists for the
/// tuple, regardless of owner.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn priority_taken(
    executor: impl PgExecutor<'_>,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM waitlist
             WHERE room_id = $1 AND check_in = $2 AND check_out = $3
               AND is_active AND kind = 'priority'
         )",
    )
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_one(executor)
    .await
}

/// Inserts an active subscription, returning its id.
///
/// Collisions surface as unique violations on `waitlist_active_unique`
/// or `waitlist_priority_unique`; the caller distinguishes them.
///
/// # Errors
///
/// Returns the underlying store error, including unique violations.
pub async fn insert_subscription(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    kind: WaitlistKind,
    group_id: Option<Uuid>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO waitlist (user_id, room_id, check_in, check_out, kind, is_active, group_id)
         VALUES ($1, $2, $3, $4, $5, true, $6)
         RETURNING id",
    )
    .bind(user_id)
    .bind(room_id)
    .bind(check_in)
    .bind(check_out)
    .bind(kind.as_str())
    .bind(group_id)
    .fetch_one(executor)
    .await
}

/// Lists active subscriptions of one kind for a room, oldest first.
///
/// Bounded to keep a single dispatch pass from scanning unbounded
/// backlogs.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn list_active_for_room(
    executor: impl PgExecutor<'_>,
    room_id: Uuid,
    kind: WaitlistKind,
) -> Result<Vec<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM waitlist
         WHERE room_id = $1 AND is_active AND kind = $2
         ORDER BY created_at ASC
         LIMIT 300",
    )
    .bind(room_id)
    .bind(kind.as_str())
    .fetch_all(executor)
    .await
}

/// Deactivates a subscription if it is still active, returning whether
/// this call flipped it.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn deactivate_subscription(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE waitlist SET is_active = false, updated_at = now()
         WHERE id = $1 AND is_active",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts a notification, returning its id.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn insert_notification(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    title: &str,
    body: &str,
    link: &str,
    group_id: Option<Uuid>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO notifications (user_id, title, body, link, group_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .bind(body)
    .bind(link)
    .bind(group_id)
    .fetch_one(executor)
    .await
}

/// Lists the newest notifications for a user.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn list_notifications(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<NotificationRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM notifications
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Counts unread notifications for a user.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn unread_count(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT count(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
        .bind(user_id)
        .fetch_one(executor)
        .await
}

/// Marks one notification read, owner-scoped. Returns whether a row
/// matched; repeat calls match and stay read.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn mark_notification_read(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications
         SET is_read = true, read_at = COALESCE(read_at, now())
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Marks every unread notification of the user read, returning how many
/// were flipped. Idempotent: a repeat call flips none.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn mark_all_notifications_read(
    executor: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications
         SET is_read = true, read_at = now()
         WHERE user_id = $1 AND NOT is_read",
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

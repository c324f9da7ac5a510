//! Session rows backing the cookie boundary.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A session row, keyed by the opaque token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Inserts a session row.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn insert_session(
    executor: impl PgExecutor<'_>,
    token: &str,
    user_id: Uuid,
    email: &str,
    role: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, email, role, expires_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(token)
    .bind(user_id)
    .bind(email)
    .bind(role)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Loads a session by token.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_session(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<Option<SessionRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sessions WHERE token = $1")
        .bind(token)
        .fetch_optional(executor)
        .await
}

/// Deletes a session by token.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn delete_session(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(())
}

impl super::Store {
    /// Deletes expired session rows. Called by the background sweep.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn delete_expired_sessions(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

//! User rows.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A user row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Looks a user up by case-folded email.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn find_user_by_email(
    executor: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(None);
    }

    sqlx::query_as("SELECT * FROM users WHERE lower(email) = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
}

/// Inserts a user with an already-hashed password, returning the new
/// id. The email collides on `users_email_unique` if taken.
///
/// # Errors
///
/// Returns the underlying store error, including the unique violation.
pub async fn insert_user(
    executor: impl PgExecutor<'_>,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .bind(role)
    .fetch_one(executor)
    .await
}

/// Lists every user's email and role, ordered by email. CLI surface.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn list_user_roles(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query_as("SELECT email, role FROM users ORDER BY email ASC")
        .fetch_all(executor)
        .await
}

/// Sets a user's role by email, returning whether a row matched.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn set_user_role(
    executor: impl PgExecutor<'_>,
    email: &str,
    role: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET role = $2, updated_at = now() WHERE lower(email) = $1",
    )
    .bind(email.trim().to_lowercase())
    .bind(role)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

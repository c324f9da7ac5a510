//! Persistence layer: PostgreSQL store for every durable entity.
//!
//! All correctness-critical synchronization lives here, pushed into
//! unique-indexed write attempts: `room_calendar (room_id, day)` for
//! bookings, `hotel_presence (hotel_id, slot)` for presence admission
//! and the partial unique indexes on `waitlist` for subscriptions.
//! Transactions provide the atomic-unit contract (all-or-nothing plus
//! read-your-writes) for the booking engine.

pub mod bookings;
pub mod hotels;
pub mod maintenance;
pub mod presence;
pub mod sessions;
pub mod users;
pub mod waitlist;

use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL-backed store shared by every service.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool for single-statement reads.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Opens an atomic unit. Within it, reads observe earlier writes of
    /// the same unit and an abort rolls everything back.
    ///
    /// # Errors
    ///
    /// Returns the underlying connection error.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}

/// Returns `true` when `err` is a unique-constraint violation,
/// optionally restricted to constraints whose name contains `name`.
///
/// The conflict engines rely on this to turn index collisions into
/// typed errors; raw duplicate-key errors never leave this layer.
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error, name: &str) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    if db_err.code().as_deref() != Some("23505") {
        return false;
    }
    if name.is_empty() {
        return true;
    }
    db_err
        .constraint()
        .is_some_and(|constraint| constraint.contains(name))
}

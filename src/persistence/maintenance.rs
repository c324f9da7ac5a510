//! Startup store maintenance: schema, indexes and the one-shot
//! room-calendar sync.
//!
//! Every statement here is idempotent, so the pass runs unconditionally
//! on boot and brings any database — empty or populated — to the shape
//! the engines expect.

use super::Store;

/// DDL executed in order on startup. The two partial unique indexes on
/// `waitlist` and the unique indexes on `room_calendar` and
/// `hotel_presence` are the concurrency primitives; everything else is
/// query support.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
        email text NOT NULL,
        password_hash text NOT NULL,
        role text NOT NULL DEFAULT 'user',
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_unique ON users (lower(email))",
    "CREATE TABLE IF NOT EXISTS hotels (
        id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
        title text NOT NULL,
        description text NOT NULL DEFAULT '',
        location text NOT NULL DEFAULT '',
        address text NOT NULL DEFAULT '',
        price_per_night double precision NOT NULL DEFAULT 0,
        rating double precision NOT NULL DEFAULT 0,
        rating_votes integer NOT NULL DEFAULT 0,
        rating_total double precision NOT NULL DEFAULT 0,
        available_rooms integer NOT NULL DEFAULT 0,
        amenities text[] NOT NULL DEFAULT '{}',
        image_url text NOT NULL DEFAULT '',
        created_by uuid,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS hotels_location_idx ON hotels (location)",
    "CREATE INDEX IF NOT EXISTS hotels_price_idx ON hotels (price_per_night)",
    "CREATE TABLE IF NOT EXISTS bookings (
        id uuid PRIMARY KEY,
        user_id uuid NOT NULL,
        room_id uuid NOT NULL,
        check_in date NOT NULL,
        check_out date NOT NULL,
        guests integer NOT NULL,
        notes text NOT NULL DEFAULT '',
        status text NOT NULL DEFAULT 'confirmed',
        group_id uuid,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS bookings_user_created_idx
        ON bookings (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS bookings_room_dates_idx
        ON bookings (room_id, check_in, check_out)",
    "CREATE TABLE IF NOT EXISTS room_calendar (
        room_id uuid NOT NULL,
        day date NOT NULL,
        booking_id uuid NOT NULL,
        created_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS room_calendar_room_day_unique
        ON room_calendar (room_id, day)",
    "CREATE INDEX IF NOT EXISTS room_calendar_booking_idx
        ON room_calendar (booking_id)",
    "CREATE TABLE IF NOT EXISTS waitlist (
        id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id uuid NOT NULL,
        room_id uuid NOT NULL,
        check_in date NOT NULL,
        check_out date NOT NULL,
        kind text NOT NULL DEFAULT 'main',
        is_active boolean NOT NULL DEFAULT true,
        group_id uuid,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS waitlist_active_unique
        ON waitlist (user_id, room_id, check_in, check_out)
        WHERE is_active",
    "CREATE UNIQUE INDEX IF NOT EXISTS waitlist_priority_unique
        ON waitlist (room_id, check_in, check_out)
        WHERE is_active AND kind = 'priority'",
    "CREATE INDEX IF NOT EXISTS waitlist_room_active_created_idx
        ON waitlist (room_id, is_active, created_at)",
    "CREATE TABLE IF NOT EXISTS notifications (
        id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id uuid NOT NULL,
        title text NOT NULL,
        body text NOT NULL DEFAULT '',
        link text NOT NULL DEFAULT '',
        is_read boolean NOT NULL DEFAULT false,
        read_at timestamptz,
        group_id uuid,
        created_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS notifications_user_created_idx
        ON notifications (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS notifications_user_unread_idx
        ON notifications (user_id, is_read)",
    "CREATE TABLE IF NOT EXISTS hotel_presence (
        hotel_id uuid NOT NULL,
        slot integer NOT NULL,
        token text NOT NULL,
        user_id text NOT NULL DEFAULT '',
        expires_at timestamptz NOT NULL,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS hotel_presence_slot_unique
        ON hotel_presence (hotel_id, slot)",
    "CREATE INDEX IF NOT EXISTS hotel_presence_token_idx
        ON hotel_presence (hotel_id, token)",
    "CREATE INDEX IF NOT EXISTS hotel_presence_expires_idx
        ON hotel_presence (expires_at)",
    "CREATE TABLE IF NOT EXISTS sessions (
        token text PRIMARY KEY,
        user_id uuid NOT NULL,
        email text NOT NULL,
        role text NOT NULL DEFAULT 'user',
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now(),
        expires_at timestamptz NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS sessions_expires_idx ON sessions (expires_at)",
];

impl Store {
    /// Brings the schema up to date and backfills the room calendar
    /// from confirmed bookings that predate the ledger.
    ///
    /// # Errors
    ///
    /// Returns the first DDL or sync error; startup must abort on any.
    pub async fn ensure_startup_maintenance(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(self.pool()).await?;
        }

        self.sync_room_calendar().await?;
        Ok(())
    }

    /// One-shot import pass: every night of every non-cancelled booking
    /// gets a ledger row unless one already exists. After this the
    /// ledger alone answers conflict checks; the booking table is never
    /// scanned on the hot path.
    async fn sync_room_calendar(&self) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO room_calendar (room_id, day, booking_id)
             SELECT b.room_id, d::date, b.id
             FROM bookings b
             CROSS JOIN LATERAL generate_series(
                 b.check_in::timestamp,
                 (b.check_out - 1)::timestamp,
                 interval '1 day'
             ) AS d
             WHERE b.status <> 'cancelled'
             ON CONFLICT (room_id, day) DO NOTHING",
        )
        .execute(self.pool())
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(
                slots = result.rows_affected(),
                "room calendar backfilled from existing bookings"
            );
        }
        Ok(())
    }
}

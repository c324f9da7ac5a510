//! Shared fixtures for the store-backed integration tests.
//!
//! Tests are gated on `TEST_DATABASE_URL`; without it they print a skip
//! notice and pass. Each test isolates itself through fresh UUIDs, so
//! the suites can share one database.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use easybook::config::AppConfig;
use easybook::domain::validation::{BookingDraft, HotelDraft};
use easybook::persistence::{Store, hotels, users};
use easybook::service::{BookingService, PresenceService, WaitlistService};

/// Connects to the test database, or `None` when the env var is unset.
///
/// # Panics
///
/// Panics when the variable is set but the database is unusable, so a
/// misconfigured CI run fails loudly instead of silently skipping.
pub async fn test_store() -> Option<Store> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let Ok(pool) = PgPoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await
    else {
        panic!("TEST_DATABASE_URL is set but unreachable");
    };

    let store = Store::new(pool);
    let Ok(()) = store.ensure_startup_maintenance().await else {
        panic!("startup maintenance failed");
    };
    Some(store)
}

/// Prints the standard skip notice.
pub fn skip_notice(test: &str) {
    eprintln!("{test}: TEST_DATABASE_URL is not set; skipping integration test");
}

/// Configuration for tests, with presence knobs injectable.
#[must_use]
pub fn test_config(presence_capacity: u32, presence_ttl_seconds: u64) -> AppConfig {
    AppConfig {
        app_env: "test".to_string(),
        port: 0,
        database_url: String::new(),
        session_secret: "test-session-secret-123".to_string(),
        hotels_page_size: 6,
        hotels_page_max: 20,
        bookings_page_size: 8,
        bookings_page_max: 25,
        presence_enabled: true,
        presence_ttl_seconds,
        presence_capacity,
        presence_min_interval_seconds: 1,
    }
}

/// The booking/waitlist service pair wired over one store.
#[must_use]
pub fn booking_services(store: &Store) -> (BookingService, Arc<WaitlistService>) {
    let waitlist = Arc::new(WaitlistService::new(store.clone()));
    (
        BookingService::new(store.clone(), Arc::clone(&waitlist)),
        waitlist,
    )
}

/// A presence service with the given knobs.
#[must_use]
pub fn presence_service(store: &Store, capacity: u32, ttl_seconds: u64) -> PresenceService {
    PresenceService::new(store.clone(), Arc::new(test_config(capacity, ttl_seconds)))
}

/// Inserts a hotel to book against, returning its id.
pub async fn create_hotel(store: &Store) -> Uuid {
    let draft = HotelDraft {
        title: Some(format!("Test Hotel {}", Uuid::new_v4())),
        description: Some("Integration test fixture hotel.".to_string()),
        location: Some("Testville".to_string()),
        address: Some("1 Fixture Street".to_string()),
        price_per_night: Some(100.0),
        rating: Some(4.0),
        available_rooms: Some(1),
        amenities: Some(vec!["wifi".to_string()]),
        image_url: None,
    };

    let owner = create_user(store).await;
    let Ok(id) = hotels::insert_hotel(store.pool(), &draft, owner).await else {
        panic!("insert fixture hotel failed");
    };
    id
}

/// Inserts a user, returning its id. The password hash is a
/// placeholder; these tests never log in through it.
pub async fn create_user(store: &Store) -> Uuid {
    let email = format!("user-{}@test.example", Uuid::new_v4());
    let Ok(id) = users::insert_user(store.pool(), &email, "unusable-hash", "user").await else {
        panic!("insert fixture user failed");
    };
    id
}

/// A booking draft for the given room and dates.
#[must_use]
pub fn draft(room_id: Uuid, check_in: &str, check_out: &str) -> BookingDraft {
    let Ok(check_in) = check_in.parse() else {
        panic!("valid check-in literal");
    };
    let Ok(check_out) = check_out.parse() else {
        panic!("valid check-out literal");
    };
    BookingDraft {
        room_id,
        check_in,
        check_out,
        guests: 2,
        notes: String::new(),
        group_id: None,
    }
}

/// Counts ledger rows for a room.
pub async fn calendar_slots(store: &Store, room_id: Uuid) -> i64 {
    let Ok(count) =
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM room_calendar WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(store.pool())
            .await
    else {
        panic!("count calendar slots failed");
    };
    count
}

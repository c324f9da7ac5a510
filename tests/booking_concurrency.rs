//! Booking engine integration tests: the no-double-booking guarantee
//! under concurrency, adjacency, and night migration on update.
//!
//! Run with `TEST_DATABASE_URL` pointing at a disposable PostgreSQL
//! database.

mod common;

use easybook::domain::validation::BookingPatch;
use easybook::error::ApiError;

#[tokio::test]
async fn parallel_create_same_nights_admits_exactly_one() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("parallel_create_same_nights_admits_exactly_one");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user_a = common::create_user(&store).await;
    let user_b = common::create_user(&store).await;
    let (bookings, _waitlist) = common::booking_services(&store);

    let draft = common::draft(room, "2030-06-10", "2030-06-12");
    let (first, second) = tokio::join!(
        bookings.create_booking(&draft, user_a),
        bookings.create_booking(&draft, user_b),
    );

    let outcomes = [first, second];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one writer must win the nights");
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(ApiError::BookingConflict))),
        "the loser must see a booking conflict"
    );

    // One booking row, one slot per night.
    assert_eq!(common::calendar_slots(&store, room).await, 2);
}

#[tokio::test]
async fn adjacent_bookings_share_no_night() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("adjacent_bookings_share_no_night");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let (bookings, _waitlist) = common::booking_services(&store);

    let first = bookings
        .create_booking(&common::draft(room, "2030-06-10", "2030-06-12"), user)
        .await;
    assert!(first.is_ok());

    // Check-out day is not a night: the adjacent range is free.
    let available = bookings
        .check_availability(&room.to_string(), "2030-06-12", "2030-06-14", None)
        .await;
    assert_eq!(available.ok(), Some(true));

    let second = bookings
        .create_booking(&common::draft(room, "2030-06-12", "2030-06-14"), user)
        .await;
    assert!(second.is_ok());

    assert_eq!(common::calendar_slots(&store, room).await, 4);

    // Now the second range is taken, unless its own booking is excluded.
    let taken = bookings
        .check_availability(&room.to_string(), "2030-06-12", "2030-06-14", None)
        .await;
    assert_eq!(taken.ok(), Some(false));

    let excluded = bookings
        .check_availability(
            &room.to_string(),
            "2030-06-12",
            "2030-06-14",
            second.ok().map(|id| id.to_string()).as_deref(),
        )
        .await;
    assert_eq!(excluded.ok(), Some(true));
}

#[tokio::test]
async fn update_migrates_nights_and_frees_old_ones() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("update_migrates_nights_and_frees_old_ones");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let other = common::create_user(&store).await;
    let (bookings, _waitlist) = common::booking_services(&store);

    let Ok(id) = bookings
        .create_booking(&common::draft(room, "2030-06-10", "2030-06-12"), user)
        .await
    else {
        panic!("create failed");
    };

    let patch = BookingPatch {
        check_in: "2030-06-20".parse().ok(),
        check_out: "2030-06-22".parse().ok(),
        ..BookingPatch::default()
    };
    assert!(bookings.update_booking(id, &patch).await.is_ok());
    assert_eq!(common::calendar_slots(&store, room).await, 2);

    // The vacated June nights are bookable again.
    let rebook = bookings
        .create_booking(&common::draft(room, "2030-06-10", "2030-06-12"), other)
        .await;
    assert!(rebook.is_ok());

    // The migrated-to nights are not.
    let clash = bookings
        .create_booking(&common::draft(room, "2030-06-21", "2030-06-23"), other)
        .await;
    assert!(matches!(clash, Err(ApiError::BookingConflict)));
}

#[tokio::test]
async fn delete_frees_all_nights() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("delete_frees_all_nights");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let (bookings, _waitlist) = common::booking_services(&store);

    let Ok(id) = bookings
        .create_booking(&common::draft(room, "2030-07-01", "2030-07-04"), user)
        .await
    else {
        panic!("create failed");
    };
    assert_eq!(common::calendar_slots(&store, room).await, 3);

    assert!(bookings.delete_booking(id).await.is_ok());
    assert_eq!(common::calendar_slots(&store, room).await, 0);

    // Deleting again is a 404.
    assert!(matches!(
        bookings.delete_booking(id).await,
        Err(ApiError::NotFound)
    ));
}

#[tokio::test]
async fn update_conflict_rolls_back_migration() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("update_conflict_rolls_back_migration");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let (bookings, _waitlist) = common::booking_services(&store);

    let Ok(moving) = bookings
        .create_booking(&common::draft(room, "2030-08-01", "2030-08-03"), user)
        .await
    else {
        panic!("create failed");
    };
    let blocker = bookings
        .create_booking(&common::draft(room, "2030-08-10", "2030-08-12"), user)
        .await;
    assert!(blocker.is_ok());

    // Try to move onto the blocker's nights.
    let patch = BookingPatch {
        check_in: "2030-08-10".parse().ok(),
        check_out: "2030-08-12".parse().ok(),
        ..BookingPatch::default()
    };
    assert!(matches!(
        bookings.update_booking(moving, &patch).await,
        Err(ApiError::BookingConflict)
    ));

    // The failed migration must not have released the original nights.
    let steal = bookings
        .create_booking(&common::draft(room, "2030-08-01", "2030-08-03"), user)
        .await;
    assert!(matches!(steal, Err(ApiError::BookingConflict)));
}

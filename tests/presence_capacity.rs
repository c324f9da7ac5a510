//! Presence admission integration tests: capacity bound under
//! concurrency, idempotent refresh, heartbeat liveness and TTL expiry.
//!
//! Run with `TEST_DATABASE_URL` pointing at a disposable PostgreSQL
//! database. The liveness tests sleep through real TTLs and take a few
//! seconds.

mod common;

use std::time::Duration;

use uuid::Uuid;

fn token() -> String {
    Uuid::new_v4().to_string()
}

#[tokio::test]
async fn capacity_one_admits_exactly_one_of_three() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("capacity_one_admits_exactly_one_of_three");
        return;
    };

    let hotel = common::create_hotel(&store).await;
    let presence = common::presence_service(&store, 1, 30);

    let (token_a, token_b, token_c) = (token(), token(), token());
    let (a, b, c) = tokio::join!(
        presence.acquire(hotel, &token_a, ""),
        presence.acquire(hotel, &token_b, ""),
        presence.acquire(hotel, &token_c, ""),
    );

    let outcomes = [a, b, c];
    let granted = outcomes
        .iter()
        .filter(|result| matches!(result, Ok((true, _))))
        .count();
    assert_eq!(granted, 1, "exactly one visitor fits into capacity 1");

    let Ok(status) = presence.status(hotel).await else {
        panic!("status failed");
    };
    assert_eq!(status.active, 1);
    assert_eq!(status.capacity, 1);
    assert!(!status.can_enter);
}

#[tokio::test]
async fn acquire_is_an_idempotent_refresh_for_the_holder() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("acquire_is_an_idempotent_refresh_for_the_holder");
        return;
    };

    let hotel = common::create_hotel(&store).await;
    let presence = common::presence_service(&store, 1, 30);
    let holder = token();

    let Ok((granted, slot)) = presence.acquire(hotel, &holder, "").await else {
        panic!("acquire failed");
    };
    assert!(granted);

    // Re-entering with the same token keeps the same slot and does not
    // consume a second one.
    let Ok((again, same_slot)) = presence.acquire(hotel, &holder, "").await else {
        panic!("refresh failed");
    };
    assert!(again);
    assert_eq!(slot, same_slot);

    let Ok(status) = presence.status(hotel).await else {
        panic!("status failed");
    };
    assert_eq!(status.active, 1);
}

#[tokio::test]
async fn heartbeat_keeps_the_slot_and_silence_releases_it() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("heartbeat_keeps_the_slot_and_silence_releases_it");
        return;
    };

    let hotel = common::create_hotel(&store).await;
    let presence = common::presence_service(&store, 1, 2);
    let holder = token();
    let challenger = token();

    let Ok((granted, _)) = presence.acquire(hotel, &holder, "").await else {
        panic!("acquire failed");
    };
    assert!(granted);

    // Renew before the 2s TTL lapses.
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(presence.heartbeat(hotel, &holder, "").await.ok(), Some(true));

    // Past the original expiry but within the renewed lease: still held.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let Ok((challenger_granted, _)) = presence.acquire(hotel, &challenger, "").await else {
        panic!("challenger acquire failed");
    };
    assert!(!challenger_granted, "renewed lease must still block entry");

    // One full TTL of silence relinquishes the slot.
    tokio::time::sleep(Duration::from_millis(2_100)).await;
    let Ok((challenger_granted, _)) = presence.acquire(hotel, &challenger, "").await else {
        panic!("challenger retry failed");
    };
    assert!(challenger_granted, "expired lease must be reclaimed");

    // The old holder's heartbeat now finds no live row.
    assert_eq!(
        presence.heartbeat(hotel, &holder, "").await.ok(),
        Some(false)
    );
}

#[tokio::test]
async fn capacity_two_fills_both_slots_independently() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("capacity_two_fills_both_slots_independently");
        return;
    };

    let hotel = common::create_hotel(&store).await;
    let presence = common::presence_service(&store, 2, 30);

    let Ok((first_granted, first_slot)) = presence.acquire(hotel, &token(), "").await else {
        panic!("first acquire failed");
    };
    let Ok((second_granted, second_slot)) = presence.acquire(hotel, &token(), "").await else {
        panic!("second acquire failed");
    };
    assert!(first_granted && second_granted);
    assert_ne!(first_slot, second_slot);

    let Ok((third_granted, _)) = presence.acquire(hotel, &token(), "").await else {
        panic!("third acquire failed");
    };
    assert!(!third_granted);
}

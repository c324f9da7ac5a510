//! Waitlist dispatcher integration tests: priority-before-main
//! ordering, duplicate rejection and the main fan-out.
//!
//! Run with `TEST_DATABASE_URL` pointing at a disposable PostgreSQL
//! database.

mod common;

use easybook::domain::WaitlistKind;
use easybook::error::ApiError;
use easybook::persistence::waitlist as waitlist_rows;

async fn unread_for(store: &easybook::persistence::Store, user: uuid::Uuid) -> i64 {
    let Ok(count) = waitlist_rows::unread_count(store.pool(), user).await else {
        panic!("unread count failed");
    };
    count
}

#[tokio::test]
async fn priority_subscriber_is_notified_first_and_exclusively() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("priority_subscriber_is_notified_first_and_exclusively");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user_a = common::create_user(&store).await;
    let user_b = common::create_user(&store).await;
    let booker = common::create_user(&store).await;
    let (bookings, waitlist) = common::booking_services(&store);

    // The room is taken for the window both subscribers want.
    let Ok(blocking) = bookings
        .create_booking(&common::draft(room, "2030-06-20", "2030-06-22"), booker)
        .await
    else {
        panic!("blocking booking failed");
    };

    let Ok((sub_a, group_a)) = waitlist
        .subscribe(
            user_a,
            &room.to_string(),
            "2030-06-20",
            "2030-06-22",
            WaitlistKind::Priority,
        )
        .await
    else {
        panic!("priority subscribe failed");
    };
    assert!(group_a.is_some(), "priority mints a group id");

    let subscribed_b = waitlist
        .subscribe(
            user_b,
            &room.to_string(),
            "2030-06-20",
            "2030-06-22",
            WaitlistKind::Main,
        )
        .await;
    assert!(subscribed_b.is_ok());

    // Deleting the blocker frees the nights and runs the dispatcher.
    assert!(bookings.delete_booking(blocking).await.is_ok());

    // Exactly one notification, for the priority subscriber, carrying
    // the group id; the main subscriber stays quiet in this dispatch.
    let Ok(notifications_a) = waitlist_rows::list_notifications(store.pool(), user_a, 10).await
    else {
        panic!("list notifications failed");
    };
    assert_eq!(notifications_a.len(), 1);
    assert_eq!(notifications_a[0].group_id, group_a);
    assert!(notifications_a[0].link.contains("checkIn=2030-06-20"));
    assert!(
        notifications_a[0]
            .link
            .contains(&format!("groupId={}", group_a.unwrap_or_default()))
    );
    assert_eq!(unread_for(&store, user_b).await, 0);

    // The winning subscription is deactivated, never deleted.
    let Ok(remaining) =
        waitlist_rows::list_active_for_room(store.pool(), room, WaitlistKind::Priority).await
    else {
        panic!("list active failed");
    };
    assert!(remaining.iter().all(|sub| sub.id != sub_a));
}

#[tokio::test]
async fn duplicate_subscription_is_rejected() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("duplicate_subscription_is_rejected");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let (_bookings, waitlist) = common::booking_services(&store);

    let first = waitlist
        .subscribe(
            user,
            &room.to_string(),
            "2030-07-01",
            "2030-07-03",
            WaitlistKind::Main,
        )
        .await;
    assert!(first.is_ok());

    let second = waitlist
        .subscribe(
            user,
            &room.to_string(),
            "2030-07-01",
            "2030-07-03",
            WaitlistKind::Main,
        )
        .await;
    assert!(matches!(second, Err(ApiError::DuplicateWaitlist)));
}

#[tokio::test]
async fn second_priority_for_the_same_window_is_rejected() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("second_priority_for_the_same_window_is_rejected");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user_a = common::create_user(&store).await;
    let user_b = common::create_user(&store).await;
    let (_bookings, waitlist) = common::booking_services(&store);

    let first = waitlist
        .subscribe(
            user_a,
            &room.to_string(),
            "2030-08-01",
            "2030-08-03",
            WaitlistKind::Priority,
        )
        .await;
    assert!(first.is_ok());

    let second = waitlist
        .subscribe(
            user_b,
            &room.to_string(),
            "2030-08-01",
            "2030-08-03",
            WaitlistKind::Priority,
        )
        .await;
    assert!(matches!(second, Err(ApiError::PriorityAlreadyTaken)));
}

#[tokio::test]
async fn main_subscribers_fan_out_when_no_priority_exists() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("main_subscribers_fan_out_when_no_priority_exists");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user_a = common::create_user(&store).await;
    let user_b = common::create_user(&store).await;
    let (_bookings, waitlist) = common::booking_services(&store);

    for user in [user_a, user_b] {
        let subscribed = waitlist
            .subscribe(
                user,
                &room.to_string(),
                "2030-09-01",
                "2030-09-03",
                WaitlistKind::Main,
            )
            .await;
        assert!(subscribed.is_ok());
    }

    // The window is free, so a dispatch wakes every main subscriber.
    let Ok(created) = waitlist.process_room(room).await else {
        panic!("process_room failed");
    };
    assert_eq!(created, 2);
    assert_eq!(unread_for(&store, user_a).await, 1);
    assert_eq!(unread_for(&store, user_b).await, 1);

    // Re-running finds nobody active and notifies nobody (idempotent).
    let Ok(repeat) = waitlist.process_room(room).await else {
        panic!("repeat process_room failed");
    };
    assert_eq!(repeat, 0);
}

#[tokio::test]
async fn mark_read_operations_are_idempotent() {
    let Some(store) = common::test_store().await else {
        common::skip_notice("mark_read_operations_are_idempotent");
        return;
    };

    let room = common::create_hotel(&store).await;
    let user = common::create_user(&store).await;
    let stranger = common::create_user(&store).await;
    let (_bookings, waitlist) = common::booking_services(&store);

    let subscribed = waitlist
        .subscribe(
            user,
            &room.to_string(),
            "2030-10-01",
            "2030-10-03",
            WaitlistKind::Main,
        )
        .await;
    assert!(subscribed.is_ok());
    let Ok(created) = waitlist.process_room(room).await else {
        panic!("process_room failed");
    };
    assert_eq!(created, 1);

    let Ok(notifications) = waitlist_rows::list_notifications(store.pool(), user, 10).await else {
        panic!("list notifications failed");
    };
    let id = notifications[0].id;

    // A stranger cannot mark someone else's notification.
    assert!(matches!(
        waitlist.mark_read(stranger, id).await,
        Err(ApiError::NotFound)
    ));

    assert!(waitlist.mark_read(user, id).await.is_ok());
    assert_eq!(unread_for(&store, user).await, 0);

    // Repeat calls change nothing further.
    assert!(waitlist.mark_read(user, id).await.is_ok());
    assert_eq!(waitlist.mark_all_read(user).await.ok(), Some(0));
}

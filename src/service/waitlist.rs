//! Waitlist dispatcher: one priority winner, then the main fan-out.
//!
//! `process_room` runs after any write that may have freed nights.
//! Phase A walks active priority subscriptions oldest-first and stops
//! at the first subscriber whose window is clean; phase B runs only if
//! phase A notified nobody and fans out to every clean main subscriber.
//! Per subscriber the order is notification insert first, subscription
//! deactivate second: a crash between the two can duplicate a
//! notification but never lose one.

use uuid::Uuid;

use crate::domain::WaitlistKind;
use crate::domain::dates::{nights, parse_date_range, today_local};
use crate::error::ApiError;
use crate::persistence::waitlist::SubscriptionRow;
use crate::persistence::{Store, bookings, hotels, is_unique_violation, waitlist};

/// Waitlist and notification engine over the store.
pub struct WaitlistService {
    store: Store,
}

impl WaitlistService {
    /// Creates the engine.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Subscribes the caller to a room's waitlist. Returns the
    /// subscription id and, for priority subscriptions, the freshly
    /// minted group id linking the winner to their eventual booking.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for malformed input or past dates,
    /// [`ApiError::DuplicateWaitlist`] when the caller already holds an
    /// active subscription for the tuple,
    /// [`ApiError::PriorityAlreadyTaken`] when another active priority
    /// subscription exists for the tuple.
    pub async fn subscribe(
        &self,
        user_id: Uuid,
        room_id: &str,
        check_in: &str,
        check_out: &str,
        kind: WaitlistKind,
    ) -> Result<(Uuid, Option<Uuid>), ApiError> {
        let room_id: Uuid = room_id
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation("invalid room id".to_string()))?;
        let (check_in, check_out) =
            parse_date_range(check_in, check_out).map_err(ApiError::Validation)?;
        if check_in < today_local() {
            return Err(ApiError::Validation(
                "cannot subscribe for past dates".to_string(),
            ));
        }
        if !hotels::hotel_exists(self.store.pool(), room_id).await? {
            return Err(ApiError::Validation(
                "Selected room does not exist".to_string(),
            ));
        }

        if waitlist::active_duplicate_exists(self.store.pool(), user_id, room_id, check_in, check_out)
            .await?
        {
            return Err(ApiError::DuplicateWaitlist);
        }

        let group_id = match kind {
            WaitlistKind::Priority => {
                if waitlist::priority_taken(self.store.pool(), room_id, check_in, check_out).await? {
                    return Err(ApiError::PriorityAlreadyTaken);
                }
                Some(Uuid::new_v4())
            }
            WaitlistKind::Main => None,
        };

        // The pre-checks race with concurrent subscribers; the partial
        // unique indexes are the authority.
        let id = waitlist::insert_subscription(
            self.store.pool(),
            user_id,
            room_id,
            check_in,
            check_out,
            kind,
            group_id,
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err, "waitlist_priority") {
                ApiError::PriorityAlreadyTaken
            } else if is_unique_violation(&err, "waitlist") {
                match kind {
                    WaitlistKind::Priority => ApiError::PriorityAlreadyTaken,
                    WaitlistKind::Main => ApiError::DuplicateWaitlist,
                }
            } else {
                ApiError::Database(err)
            }
        })?;

        Ok((id, group_id))
    }

    /// Dispatches notifications for a room whose nights may have been
    /// freed. Returns how many notifications were created.
    ///
    /// # Errors
    ///
    /// Returns the first store error; partially processed subscribers
    /// keep their notifications.
    pub async fn process_room(&self, room_id: Uuid) -> Result<u64, ApiError> {
        let created = self
            .process_kind(room_id, WaitlistKind::Priority, true)
            .await?;
        if created > 0 {
            return Ok(created);
        }

        self.process_kind(room_id, WaitlistKind::Main, false).await
    }

    async fn process_kind(
        &self,
        room_id: Uuid,
        kind: WaitlistKind,
        stop_after_first: bool,
    ) -> Result<u64, ApiError> {
        let subscriptions =
            waitlist::list_active_for_room(self.store.pool(), room_id, kind).await?;

        let today = today_local();
        let mut created = 0u64;

        for subscription in subscriptions {
            if !self.window_is_free(&subscription, today).await? {
                continue;
            }

            self.notify_subscriber(&subscription).await?;
            created += 1;

            if stop_after_first {
                break;
            }
        }

        Ok(created)
    }

    /// A subscriber is only woken while their window is still in the
    /// future and fully free in the ledger. Dispatch is not serialized
    /// against concurrent bookings; the notification link re-gates
    /// through the booking engine anyway.
    async fn window_is_free(
        &self,
        subscription: &SubscriptionRow,
        today: chrono::NaiveDate,
    ) -> Result<bool, ApiError> {
        if subscription.check_in < today {
            return Ok(false);
        }

        let days = nights(subscription.check_in, subscription.check_out);
        if days.is_empty() {
            return Ok(false);
        }

        let conflict =
            bookings::conflict_exists(self.store.pool(), subscription.room_id, &days, None)
                .await?;
        Ok(!conflict)
    }

    async fn notify_subscriber(&self, subscription: &SubscriptionRow) -> Result<(), ApiError> {
        let mut link = format!(
            "/bookings/new?hotelId={}&checkIn={}&checkOut={}",
            subscription.room_id, subscription.check_in, subscription.check_out,
        );
        if let Some(group_id) = subscription.group_id {
            link.push_str(&format!("&groupId={group_id}"));
        }

        let body = format!(
            "Room is now available for {} to {}.",
            subscription.check_in, subscription.check_out,
        );

        waitlist::insert_notification(
            self.store.pool(),
            subscription.user_id,
            "Room is available now",
            &body,
            &link,
            subscription.group_id,
        )
        .await?;

        // Deactivation only after the notification is durable. Failing
        // here re-notifies the subscriber on the next dispatch, which
        // beats deactivating someone who was never told.
        match waitlist::deactivate_subscription(self.store.pool(), subscription.id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    subscription = %subscription.id,
                    "subscription already deactivated by a concurrent dispatch"
                );
            }
            Err(err) => {
                tracing::warn!(
                    subscription = %subscription.id,
                    error = %err,
                    "failed to deactivate notified subscription"
                );
            }
        }
        Ok(())
    }

    /// Lists the caller's newest notifications plus their unread count.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<(Vec<waitlist::NotificationRow>, i64), ApiError> {
        let limit = if (1..=200).contains(&limit) { limit } else { 100 };
        let items = waitlist::list_notifications(self.store.pool(), user_id, limit).await?;
        let unread = waitlist::unread_count(self.store.pool(), user_id).await?;
        Ok((items, unread))
    }

    /// Marks one of the caller's notifications read.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when the row is absent or owned by
    /// someone else.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        if waitlist::mark_notification_read(self.store.pool(), user_id, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }

    /// Marks all of the caller's notifications read, returning how many
    /// flipped. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ApiError> {
        Ok(waitlist::mark_all_notifications_read(self.store.pool(), user_id).await?)
    }
}

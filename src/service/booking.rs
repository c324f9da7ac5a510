//! Booking engine: validated, conflict-checked, atomic reservation of
//! calendar nights.
//!
//! Every write runs the same shape inside one transaction: conflict
//! check against the ledger, reserve (or re-reserve) the nights, then
//! touch the booking row. Two concurrent creates for overlapping
//! nights race on the ledger's `(room_id, day)` unique index; exactly
//! one commits and the loser surfaces [`ApiError::BookingConflict`].

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::dates::{nights, parse_date_range, today_local};
use crate::domain::validation::{BookingDraft, BookingPatch};
use crate::error::ApiError;
use crate::persistence::{Store, bookings, hotels, is_unique_violation};
use crate::service::WaitlistService;

/// Booking engine over the store.
pub struct BookingService {
    store: Store,
    waitlist: Arc<WaitlistService>,
}

impl BookingService {
    /// Creates the engine.
    #[must_use]
    pub fn new(store: Store, waitlist: Arc<WaitlistService>) -> Self {
        Self { store, waitlist }
    }

    /// Creates a confirmed booking for `owner`, returning the new id.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a missing room,
    /// [`ApiError::BookingConflict`] when any requested night is taken.
    pub async fn create_booking(
        &self,
        draft: &BookingDraft,
        owner: Uuid,
    ) -> Result<Uuid, ApiError> {
        if !hotels::hotel_exists(self.store.pool(), draft.room_id).await? {
            return Err(ApiError::Validation(
                "Selected room does not exist".to_string(),
            ));
        }

        let days = nights(draft.check_in, draft.check_out);
        let booking_id = Uuid::new_v4();

        let mut tx = self.store.begin().await?;

        if bookings::conflict_exists(&mut *tx, draft.room_id, &days, None).await? {
            return Err(ApiError::BookingConflict);
        }
        bookings::reserve_nights(&mut *tx, draft.room_id, booking_id, &days)
            .await
            .map_err(map_ledger_error)?;
        bookings::insert_booking(
            &mut *tx,
            booking_id,
            owner,
            draft.room_id,
            draft.check_in,
            draft.check_out,
            draft.guests,
            &draft.notes,
            draft.group_id,
        )
        .await?;

        tx.commit().await?;
        Ok(booking_id)
    }

    /// Applies a patch to a booking. When the (room, dates) tuple
    /// changes, the old nights are released and the new ones reserved
    /// within the same transaction.
    ///
    /// Returns the rooms whose nights were touched, already dispatched
    /// to the waitlist.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] for a missing booking,
    /// [`ApiError::Validation`] for a bad resulting range or room,
    /// [`ApiError::BookingConflict`] when the new nights are taken.
    pub async fn update_booking(&self, id: Uuid, patch: &BookingPatch) -> Result<(), ApiError> {
        let mut tx = self.store.begin().await?;

        let existing = bookings::find_booking_for_update(&mut *tx, id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let next_room = patch.room_id.unwrap_or(existing.room_id);
        let next_check_in = patch.check_in.unwrap_or(existing.check_in);
        let next_check_out = patch.check_out.unwrap_or(existing.check_out);

        if next_check_out <= next_check_in {
            return Err(ApiError::Validation(
                "check-out must be after check-in".to_string(),
            ));
        }
        if patch.check_in.is_some() && next_check_in < today_local() {
            return Err(ApiError::Validation(
                "Check-in date must be today or later".to_string(),
            ));
        }
        if let Some(room_id) = patch.room_id
            && !hotels::hotel_exists(&mut *tx, room_id).await?
        {
            return Err(ApiError::Validation(
                "Selected room does not exist".to_string(),
            ));
        }

        let days = nights(next_check_in, next_check_out);
        if bookings::conflict_exists(&mut *tx, next_room, &days, Some(id)).await? {
            return Err(ApiError::BookingConflict);
        }

        let slot_changed = next_room != existing.room_id
            || next_check_in != existing.check_in
            || next_check_out != existing.check_out;
        if slot_changed {
            bookings::release_nights(&mut *tx, id).await?;
            bookings::reserve_nights(&mut *tx, next_room, id, &days)
                .await
                .map_err(map_ledger_error)?;
        }

        bookings::update_booking_row(
            &mut *tx,
            id,
            next_room,
            next_check_in,
            next_check_out,
            patch.guests.unwrap_or(existing.guests),
            patch.notes.as_deref().unwrap_or(&existing.notes),
            patch.group_id.or(existing.group_id),
        )
        .await?;

        tx.commit().await?;

        // Any nights that changed hands may unblock subscribers on the
        // old room or the new one.
        self.dispatch_waitlist(&[existing.room_id, next_room]).await;
        Ok(())
    }

    /// Deletes a booking and its calendar slots, then dispatches the
    /// waitlist for the freed room.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] for a missing booking.
    pub async fn delete_booking(&self, id: Uuid) -> Result<(), ApiError> {
        let mut tx = self.store.begin().await?;

        let existing = bookings::find_booking_for_update(&mut *tx, id)
            .await?
            .ok_or(ApiError::NotFound)?;
        bookings::delete_booking_row(&mut *tx, id).await?;
        bookings::release_nights(&mut *tx, id).await?;

        tx.commit().await?;

        self.dispatch_waitlist(&[existing.room_id]).await;
        Ok(())
    }

    /// Best-effort availability preflight: answers "would a create
    /// succeed right now". Non-transactional by design — the ledger
    /// re-gates on the actual write.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for malformed inputs.
    pub async fn check_availability(
        &self,
        room_id: &str,
        check_in: &str,
        check_out: &str,
        exclude_booking_id: Option<&str>,
    ) -> Result<bool, ApiError> {
        let room_id: Uuid = room_id
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation("invalid room id".to_string()))?;
        let (check_in, check_out) =
            parse_date_range(check_in, check_out).map_err(ApiError::Validation)?;
        let exclude = match exclude_booking_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(text) => Some(
                text.parse::<Uuid>()
                    .map_err(|_| ApiError::Validation("invalid booking id".to_string()))?,
            ),
            None => None,
        };

        let days = nights(check_in, check_out);
        let conflict =
            bookings::conflict_exists(self.store.pool(), room_id, &days, exclude).await?;
        Ok(!conflict)
    }

    /// Runs waitlist dispatch for each distinct room, logging failures
    /// instead of surfacing them to the caller whose write already
    /// committed.
    async fn dispatch_waitlist(&self, rooms: &[Uuid]) {
        let mut seen = HashSet::new();
        for room_id in rooms {
            if !seen.insert(*room_id) {
                continue;
            }
            if let Err(err) = self.waitlist.process_room(*room_id).await {
                tracing::error!(%room_id, error = %err, "waitlist processing failed");
            }
        }
    }
}

/// Maps a failed ledger insert: a collision on the (room, day) unique
/// index means another booking holds at least one night.
fn map_ledger_error(err: sqlx::Error) -> ApiError {
    if is_unique_violation(&err, "room_calendar") {
        ApiError::BookingConflict
    } else {
        ApiError::Database(err)
    }
}

//! Presence admission: capacity-bounded, TTL-leased viewing slots.
//!
//! A visitor holds at most one slot per hotel, keyed by an opaque
//! browser token. Admission walks the slot ordinals and claims the
//! first position that is free, expired, or already ours; concurrent
//! acquirers racing for the last slot serialize on the
//! `(hotel_id, slot)` unique index and exactly one is granted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::persistence::{Store, presence};

/// Hard ceiling on configured capacity.
const MAX_CAPACITY: u32 = 20;

/// Snapshot of a hotel's presence occupancy.
#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
pub struct PresenceStatus {
    /// Live leases.
    pub active: i64,
    /// Configured capacity.
    pub capacity: i64,
    /// Whether a fresh visitor would currently be admitted.
    pub can_enter: bool,
}

/// Presence engine over the store.
pub struct PresenceService {
    store: Store,
    enabled: bool,
    ttl: Duration,
    capacity: i32,
    min_interval: Duration,
}

impl PresenceService {
    /// Creates the engine with clamped configuration.
    #[must_use]
    pub fn new(store: Store, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            enabled: config.presence_enabled,
            ttl: Duration::from_secs(config.presence_ttl_seconds.max(1)),
            capacity: config.presence_capacity.clamp(1, MAX_CAPACITY) as i32,
            min_interval: Duration::from_secs(config.presence_min_interval_seconds),
        }
    }

    /// Whether the subsystem is enabled at all. Disabled deployments
    /// admit everyone.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Configured capacity after clamping.
    #[must_use]
    pub const fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Minimum interval between status/heartbeat calls per caller.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Acquires (or refreshes) a viewing slot for the token. Returns
    /// `(granted, slot_ordinal)`; a denied caller is redirected to the
    /// wait page.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a blank token, otherwise store
    /// errors.
    pub async fn acquire(
        &self,
        hotel_id: Uuid,
        token: &str,
        user_id: &str,
    ) -> Result<(bool, i32), ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::Validation("token is required".to_string()));
        }

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl)
                .map_err(|err| ApiError::Internal(err.to_string()))?;

        // Idempotent refresh: the token may already hold a slot here.
        if let Some(slot) =
            presence::refresh_own_slot(self.store.pool(), hotel_id, token, user_id, expires_at)
                .await?
        {
            return Ok((true, slot));
        }

        for slot in 1..=self.capacity {
            if presence::try_claim_slot(
                self.store.pool(),
                hotel_id,
                slot,
                token,
                user_id,
                expires_at,
            )
            .await?
            {
                return Ok((true, slot));
            }
        }

        Ok((false, 0))
    }

    /// Extends a live lease. Returns `false` when the token no longer
    /// holds a slot and must re-enter through admission.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a blank token, otherwise store
    /// errors.
    pub async fn heartbeat(
        &self,
        hotel_id: Uuid,
        token: &str,
        user_id: &str,
    ) -> Result<bool, ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::Validation("token is required".to_string()));
        }

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl)
                .map_err(|err| ApiError::Internal(err.to_string()))?;

        Ok(
            presence::extend_live_slot(self.store.pool(), hotel_id, token, user_id, expires_at)
                .await?,
        )
    }

    /// Reports live occupancy for the hotel.
    ///
    /// # Errors
    ///
    /// Returns the underlying store error.
    pub async fn status(&self, hotel_id: Uuid) -> Result<PresenceStatus, ApiError> {
        let active = presence::count_live_slots(self.store.pool(), hotel_id, self.capacity).await?;
        Ok(PresenceStatus {
            active,
            capacity: i64::from(self.capacity),
            can_enter: active < i64::from(self.capacity),
        })
    }
}

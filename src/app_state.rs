//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::rate_limiter::RequestRateLimiter;
use crate::persistence::Store;
use crate::service::{BookingService, PresenceService, WaitlistService};
use crate::session::SessionManager;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration snapshot.
    pub config: Arc<AppConfig>,
    /// PostgreSQL-backed store.
    pub store: Store,
    /// Session manager for the cookie boundary.
    pub sessions: Arc<SessionManager>,
    /// Booking engine.
    pub bookings: Arc<BookingService>,
    /// Waitlist and notification dispatcher.
    pub waitlist: Arc<WaitlistService>,
    /// Presence admission engine.
    pub presence: Arc<PresenceService>,
    /// In-process presence request limiter.
    pub limiter: Arc<RequestRateLimiter>,
}

impl AppState {
    /// Wires the full service graph on top of a connected store.
    #[must_use]
    pub fn new(config: AppConfig, store: Store, sessions: SessionManager) -> Self {
        let config = Arc::new(config);
        let waitlist = Arc::new(WaitlistService::new(store.clone()));
        let bookings = Arc::new(BookingService::new(store.clone(), Arc::clone(&waitlist)));
        let presence = Arc::new(PresenceService::new(store.clone(), Arc::clone(&config)));

        Self {
            config,
            store,
            sessions: Arc::new(sessions),
            bookings,
            waitlist,
            presence,
            limiter: Arc::new(RequestRateLimiter::new()),
        }
    }
}

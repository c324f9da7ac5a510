//! Service layer: the three admission engines.
//!
//! [`BookingService`] owns the atomic reserve-and-insert path,
//! [`WaitlistService`] the two-phase release dispatch, and
//! [`PresenceService`] the TTL-leased slot table. Each delegates
//! serialization to the store's unique indexes rather than in-process
//! locks, so the guarantees hold across instances.

pub mod booking;
pub mod presence;
pub mod waitlist;

pub use booking::BookingService;
pub use presence::{PresenceService, PresenceStatus};
pub use waitlist::WaitlistService;

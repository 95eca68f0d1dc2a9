//! # Handshake Engine
//!
//! Drives spec §4.4's four-phase DID-bound handshake: Invitation (1) →
//! Request (2) → Response (3) → Complete (4). [`Initiator`] drives phases 1
//! and 3; [`Responder`] drives phases 2 and 4. Both are one-shot: once a
//! state machine reaches `Established` it hands its caller a `SessionSeed`
//! and has nothing further to do, so the session manager owns everything
//! that happens after.
//!
//! Shared validation (clock skew, nonce replay, signature/DID checks) lives
//! here so the two state machines apply it identically.

mod initiator;
mod nonce_cache;
mod responder;

pub use initiator::{Initiator, InitiatorState};
pub use nonce_cache::NonceCache;
pub use responder::{Responder, ResponderState};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::message::Timestamp;

/// Check a handshake-phase timestamp against the local clock, allowing
/// `max_skew` in either direction (spec §4.4, "reject if timestamp is
/// outside max_clock_skew").
pub(crate) fn validate_timestamp(timestamp: Timestamp, max_skew: Duration) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let skew = max_skew.as_secs();
    let lower = now.saturating_sub(skew);
    let upper = now.saturating_add(skew);
    timestamp >= lower && timestamp <= upper
}

//! # Per-Peer Abuse Throttling
//!
//! Spec §5: bound the number of concurrent in-flight handshakes a single
//! peer DID may hold open, and refuse further Invitations from a peer
//! whose recent authentication failures cross `auth_failure_threshold`.
//! Both counters live in one `parking_lot::Mutex<HashMap<...>>`, matching
//! the [`crate::handshake::NonceCache`] shape: short-lived entries, no
//! sharding needed at the scale this crate targets.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::SageError;

struct PeerState {
    in_flight_handshakes: u32,
    recent_failures: Vec<Instant>,
}

impl Default for PeerState {
    fn default() -> Self {
        Self {
            in_flight_handshakes: 0,
            recent_failures: Vec::new(),
        }
    }
}

/// Tracks concurrent handshake slots and recent auth failures per peer DID.
pub struct RateLimiter {
    max_concurrent_handshakes: u32,
    auth_failure_threshold: u32,
    failure_window: Duration,
    peers: Mutex<HashMap<String, PeerState>>,
}

impl RateLimiter {
    pub fn new(max_concurrent_handshakes: u32, auth_failure_threshold: u32) -> Self {
        Self {
            max_concurrent_handshakes,
            auth_failure_threshold,
            failure_window: Duration::from_secs(60),
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve a handshake slot for `peer_did`. Returns `Capacity` if the
    /// peer already holds `max_concurrent_handshakes` open, or
    /// `RateLimited` if the peer has too many recent authentication
    /// failures. Call [`Self::release`] once the handshake reaches a
    /// terminal state (established or failed).
    pub fn try_begin_handshake(&self, peer_did: &str) -> Result<(), SageError> {
        let mut peers = self.peers.lock();
        let state = peers.entry(peer_did.to_string()).or_default();

        let now = Instant::now();
        state
            .recent_failures
            .retain(|&seen_at| now.saturating_duration_since(seen_at) < self.failure_window);

        if state.recent_failures.len() as u32 >= self.auth_failure_threshold {
            tracing::warn!(peer_did, "rate limiting peer after repeated auth failures");
            return Err(SageError::rate_limited(format!(
                "peer {peer_did} exceeded {} authentication failures in the last minute",
                self.auth_failure_threshold
            )));
        }

        if state.in_flight_handshakes >= self.max_concurrent_handshakes {
            tracing::warn!(peer_did, "peer at concurrent handshake capacity");
            return Err(SageError::capacity(format!(
                "peer {peer_did} already has {} concurrent handshakes in flight",
                self.max_concurrent_handshakes
            )));
        }

        state.in_flight_handshakes += 1;
        Ok(())
    }

    /// Release a previously reserved handshake slot.
    pub fn release(&self, peer_did: &str) {
        let mut peers = self.peers.lock();
        if let Some(state) = peers.get_mut(peer_did) {
            state.in_flight_handshakes = state.in_flight_handshakes.saturating_sub(1);
        }
    }

    /// Record an authentication failure attributed to `peer_did`.
    pub fn record_auth_failure(&self, peer_did: &str) {
        let mut peers = self.peers.lock();
        let state = peers.entry(peer_did.to_string()).or_default();
        state.recent_failures.push(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_handshakes_up_to_the_concurrency_cap() {
        let limiter = RateLimiter::new(2, 5);
        limiter.try_begin_handshake("did:sage:test:alice").unwrap();
        limiter.try_begin_handshake("did:sage:test:alice").unwrap();
        assert!(limiter.try_begin_handshake("did:sage:test:alice").is_err());
    }

    #[test]
    fn release_frees_a_slot() {
        let limiter = RateLimiter::new(1, 5);
        limiter.try_begin_handshake("did:sage:test:alice").unwrap();
        assert!(limiter.try_begin_handshake("did:sage:test:alice").is_err());
        limiter.release("did:sage:test:alice");
        limiter.try_begin_handshake("did:sage:test:alice").unwrap();
    }

    #[test]
    fn different_peers_have_independent_slots() {
        let limiter = RateLimiter::new(1, 5);
        limiter.try_begin_handshake("did:sage:test:alice").unwrap();
        limiter.try_begin_handshake("did:sage:test:bob").unwrap();
    }

    #[test]
    fn auth_failure_threshold_blocks_new_handshakes() {
        let limiter = RateLimiter::new(10, 2);
        limiter.record_auth_failure("did:sage:test:alice");
        limiter.record_auth_failure("did:sage:test:alice");
        assert!(limiter.try_begin_handshake("did:sage:test:alice").is_err());
    }
}

//! # Nonce Cache
//!
//! Spec §3 `NonceCache`: process-wide mapping from `(peerDID, nonce)` to
//! first-seen timestamp, evicting entries older than the accept-skew
//! window. Spec §5 calls for "a concurrent map with TTL eviction; single
//! mutex acceptable since entries are short-lived and writes infrequent" —
//! this is a `parking_lot::Mutex<HashMap<...>>`, not a sharded structure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Tracks nonces seen per peer DID within the configured TTL, rejecting a
/// nonce the second time it appears for the same DID.
pub struct NonceCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, String), Instant>>,
}

impl NonceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record `nonce` as seen for `peer_did` if it is unseen (or its prior
    /// sighting has expired). Returns `true` if the nonce was accepted
    /// (fresh), `false` if it is a replay within the TTL window.
    pub fn observe(&self, peer_did: &str, nonce: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.evict_locked(&mut entries, now);

        let key = (peer_did.to_string(), nonce.to_string());
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, now);
        true
    }

    /// Number of live (non-expired) entries. Exposed for tests and
    /// operational introspection.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.evict_locked(&mut entries, now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_locked(&self, entries: &mut HashMap<(String, String), Instant>, now: Instant) {
        entries.retain(|_, &mut seen_at| now.saturating_duration_since(seen_at) < self.ttl);
    }
}

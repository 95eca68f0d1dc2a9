//! # Runtime Configuration
//!
//! `SageConfig` holds the tunables the core itself reads. Loading a config
//! from a file, environment, or CLI flags is out of scope for this crate;
//! callers construct a `SageConfig` however they like and pass it in — a
//! plain validated struct with no file-loading code of its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::aead::AeadAlgorithm;
use crate::error::SageError;

/// Tunables recognized by the handshake engine and session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    /// Window for handshake timestamp validity.
    #[serde(with = "duration_secs")]
    pub max_clock_skew: Duration,

    /// Retention period for anti-replay nonces.
    #[serde(with = "duration_secs")]
    pub nonce_cache_ttl: Duration,

    /// Per-session idle expiry.
    #[serde(with = "duration_secs")]
    pub idle_session_ttl: Duration,

    /// Period between sweep-task runs.
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,

    /// Session table capacity.
    pub max_sessions: usize,

    /// Per-peer concurrent handshake cap.
    pub max_concurrent_handshakes: usize,

    /// Data-plane replay window width, in counters. Must be a power of two.
    pub replay_window: u32,

    /// Counter cap before a session is forcibly rotated/closed.
    pub max_messages_per_session: u64,

    /// AEAD failure count that triggers a forced session close.
    pub max_aead_failures: u32,

    /// Enforce the DID document's `active` flag on every resolve.
    pub require_active_agent: bool,

    /// Ordered AEAD algorithm preference, most preferred first.
    pub preferred_algorithms: Vec<AeadAlgorithm>,

    /// Sliding-minute threshold of failed handshake signatures from one
    /// peer DID before further invitations are refused with `RateLimited`.
    pub auth_failure_threshold: u32,
}

impl Default for SageConfig {
    fn default() -> Self {
        Self {
            max_clock_skew: Duration::from_secs(5 * 60),
            nonce_cache_ttl: Duration::from_secs(10 * 60),
            idle_session_ttl: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
            max_sessions: 10_000,
            max_concurrent_handshakes: 4,
            replay_window: 1024,
            max_messages_per_session: 1 << 48,
            max_aead_failures: 8,
            require_active_agent: true,
            preferred_algorithms: vec![AeadAlgorithm::ChaCha20Poly1305],
            auth_failure_threshold: 5,
        }
    }
}

impl SageConfig {
    /// Validate internal consistency. Configuration errors are detected at
    /// startup and are fatal; nothing in this crate retries a bad config.
    pub fn validate(&self) -> Result<(), SageError> {
        if self.replay_window == 0 || !self.replay_window.is_power_of_two() {
            return Err(SageError::protocol_violation(format!(
                "replay_window must be a nonzero power of two, got {}",
                self.replay_window
            )));
        }
        if self.preferred_algorithms.is_empty() {
            return Err(SageError::protocol_violation(
                "preferred_algorithms must not be empty",
            ));
        }
        if self.max_sessions == 0 {
            return Err(SageError::protocol_violation(
                "max_sessions must be at least 1",
            ));
        }
        if self.max_concurrent_handshakes == 0 {
            return Err(SageError::protocol_violation(
                "max_concurrent_handshakes must be at least 1",
            ));
        }
        if self.max_messages_per_session == 0 {
            return Err(SageError::protocol_violation(
                "max_messages_per_session must be at least 1",
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_configuration_table() {
        let cfg = SageConfig::default();
        assert_eq!(cfg.max_clock_skew, Duration::from_secs(300));
        assert_eq!(cfg.nonce_cache_ttl, Duration::from_secs(600));
        assert_eq!(cfg.idle_session_ttl, Duration::from_secs(1800));
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(300));
        assert_eq!(cfg.max_sessions, 10_000);
        assert_eq!(cfg.max_concurrent_handshakes, 4);
        assert_eq!(cfg.replay_window, 1024);
        assert_eq!(cfg.max_messages_per_session, 1u64 << 48);
        assert_eq!(cfg.max_aead_failures, 8);
        assert!(cfg.require_active_agent);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_replay_window() {
        let mut cfg = SageConfig::default();
        cfg.replay_window = 1000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_algorithm_preference() {
        let mut cfg = SageConfig::default();
        cfg.preferred_algorithms.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let cfg = SageConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}

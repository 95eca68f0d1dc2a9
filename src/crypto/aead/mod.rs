//! # ChaCha20-Poly1305 AEAD Module
//!
//! This module provides authenticated encryption using ChaCha20-Poly1305
//! with the 12-byte nonce construction the session manager requires:
//! `nonce = counter_be64 || direction_tag(4B)`. Nonces are never random in
//! the data plane — uniqueness is guaranteed by the per-session monotonic
//! send counter, not by sampling.
//!
//! ## Components
//!
//! - [`AeadKey`]: 32-byte encryption key (zeroizes on drop)
//! - [`AeadNonce`]: 12-byte nonce, built from a counter and direction tag
//! - [`seal`] / [`open`]: one-shot encrypt/decrypt
//! - [`AeadAlgorithm`]: tagged algorithm identifier used during capability
//!   negotiation (only `ChaCha20Poly1305` is implemented; `Aes256Gcm` is
//!   representable so the handshake can negotiate and reject it the same
//!   way it rejects any other unimplemented or unknown algorithm tag)

mod chacha20poly1305;

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use self::chacha20poly1305::{open, seal};

/// Length of the direction tag embedded in a data-plane nonce.
pub const DIRECTION_TAG_LEN: usize = 4;

/// Direction tag used when the session manager derives a nonce for traffic
/// it is sending (as opposed to traffic it is receiving).
pub const DIRECTION_OUTBOUND: [u8; DIRECTION_TAG_LEN] = *b"out\0";

/// Direction tag used for traffic received from the peer.
pub const DIRECTION_INBOUND: [u8; DIRECTION_TAG_LEN] = *b"in\0\0";

/// ChaCha20-Poly1305 key (32 bytes). Zeroizes on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AeadKey([u8; 32]);

impl AeadKey {
    /// Build a key from exactly 32 bytes, typically an HKDF output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::crypto::error::CryptoError> {
        if bytes.len() != 32 {
            return Err(crate::crypto::error::CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for AeadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AeadKey").field(&"[redacted]").finish()
    }
}

/// A 12-byte ChaCha20-Poly1305 nonce constructed as
/// `counter (8B big-endian) || direction_tag (4B)`.
///
/// Unlike XChaCha20's 24-byte random nonce, this is deterministic: the
/// caller is responsible for never reusing a `(key, counter, direction)`
/// triple, which the session manager's monotonic send counter guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AeadNonce([u8; 12]);

impl AeadNonce {
    /// Construct a nonce from a send/recv counter and a 4-byte direction
    /// tag. `direction_tag` disambiguates the two per-session keys from
    /// colliding even if a counter value were ever reused across them.
    pub fn from_counter(counter: u64, direction_tag: [u8; DIRECTION_TAG_LEN]) -> Self {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&counter.to_be_bytes());
        bytes[8..].copy_from_slice(&direction_tag);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// AEAD algorithm identifier used during handshake capability negotiation.
///
/// Carries an `Other` fallback so a malicious or legacy peer advertising an
/// algorithm this crate never implements (e.g. `3DES`) still round-trips
/// through canonical encoding instead of failing to parse — rejection
/// happens at selection time (`Downgrade`), not at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    ChaCha20Poly1305,
    Aes256Gcm,
    Other(String),
}

impl AeadAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            Self::Aes256Gcm => "AES-256-GCM",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AeadAlgorithm {
    fn from(s: &str) -> Self {
        match s {
            "ChaCha20-Poly1305" => Self::ChaCha20Poly1305,
            "AES-256-GCM" => Self::Aes256Gcm,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for AeadAlgorithm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AeadAlgorithm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AeadAlgorithm::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_bytes() {
        let bytes = [42u8; 32];
        let key = AeadKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn test_key_invalid_length() {
        let result = AeadKey::from_bytes(&[0u8; 16]);
        assert!(result.is_err());
    }

    #[test]
    fn test_key_debug_redacts() {
        let key = AeadKey::from_bytes(&[1u8; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "AeadKey(\"[redacted]\")");
    }

    #[test]
    fn test_nonce_layout() {
        let nonce = AeadNonce::from_counter(1, DIRECTION_OUTBOUND);
        assert_eq!(&nonce.as_bytes()[..8], &1u64.to_be_bytes());
        assert_eq!(&nonce.as_bytes()[8..], &DIRECTION_OUTBOUND);
    }

    #[test]
    fn test_nonce_distinguishes_direction() {
        let out = AeadNonce::from_counter(7, DIRECTION_OUTBOUND);
        let inb = AeadNonce::from_counter(7, DIRECTION_INBOUND);
        assert_ne!(out, inb);
    }

    #[test]
    fn test_algorithm_roundtrip() {
        for name in ["ChaCha20-Poly1305", "AES-256-GCM", "3DES"] {
            let algo = AeadAlgorithm::from(name);
            assert_eq!(algo.as_str(), name);
        }
    }

    #[test]
    fn test_algorithm_serde_roundtrip() {
        let algo = AeadAlgorithm::ChaCha20Poly1305;
        let json = serde_json::to_string(&algo).unwrap();
        assert_eq!(json, "\"ChaCha20-Poly1305\"");
        let back: AeadAlgorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(algo, back);
    }
}

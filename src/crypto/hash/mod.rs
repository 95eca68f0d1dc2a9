//! # SHA-256 Hash Module
//!
//! This module provides SHA-256 hashing used for transcript binding in the
//! handshake protocol and for the canonical encoding's content digests.
//!
//! ## Components
//!
//! - [`HashOutput`]: 32-byte hash output type (implements `Zeroize`)
//! - [`sha256`]: one-shot convenience function
//! - [`Sha256Hasher`]: incremental hasher with update/finalize API

mod sha256;

use zeroize::{Zeroize, ZeroizeOnDrop};

pub use self::sha256::{sha256, Sha256Hasher};

/// 32-byte SHA-256 hash output.
///
/// This newtype wrapper prevents accidental misuse with other 32-byte
/// types (keys, nonces). Implements [`Zeroize`] and [`ZeroizeOnDrop`]
/// because transcript hashes participate in signed data and should not
/// linger in memory longer than needed.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct HashOutput([u8; 32]);

impl HashOutput {
    /// Create a new `HashOutput` from a 32-byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get a reference to the underlying 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_output_creation() {
        let bytes = [42u8; 32];
        let hash = HashOutput::from_bytes(bytes);
        assert_eq!(hash.as_bytes(), &bytes);
    }

    #[test]
    fn test_hash_output_zeroize() {
        let mut hash = HashOutput::from_bytes([0x42; 32]);
        hash.zeroize();
        assert_eq!(hash.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_hash_output_hex() {
        let hash = HashOutput::from_bytes([0xab; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! # Cryptographic Error Types
//!
//! Unified error handling for all cryptographic primitives used by the
//! handshake engine, HPKE layer, and session manager.
//!
//! ## Design Principles
//!
//! - **No Information Leakage**: Error messages never contain key material,
//!   plaintext, or signatures.
//! - **Detailed Context**: Each error provides actionable information.
//! - **Type Safety**: Strongly typed errors prevent silent failures.

use thiserror::Error;

/// Result type alias for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Unified error type for all cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation function failed.
    #[error("key derivation failed: {0}")]
    KdfError(String),

    /// Authenticated encryption/decryption operation failed for a reason
    /// other than tag verification (invalid key/nonce length, RNG failure).
    #[error("AEAD operation failed: {0}")]
    AeadError(String),

    /// AEAD tag verification failed — the ciphertext or AAD was tampered
    /// with, or the wrong key was used.
    #[error("decryption failure: authentication tag mismatch")]
    DecryptionFailure,

    /// Key encapsulation/decapsulation operation failed.
    #[error("KEM operation failed: {0}")]
    KemError(String),

    /// An HPKE sender/receiver context operation failed.
    #[error("HPKE operation failed: {0}")]
    HpkeError(String),

    /// A signature could not be produced or did not verify.
    #[error("signature verification failed")]
    InvalidSignature,

    /// An operation was attempted with a key of the wrong algorithm.
    #[error("key type mismatch: expected {expected}, got {actual}")]
    InvalidKeyType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Invalid key length provided.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Generic integrity verification failure not covered above.
    #[error("verification failed: data integrity cannot be guaranteed")]
    VerificationFailed,

    /// Internal cryptographic error from the underlying library.
    #[error("internal cryptographic error: {0}")]
    InternalError(String),
}

impl CryptoError {
    pub fn kdf(msg: impl Into<String>) -> Self {
        Self::KdfError(msg.into())
    }

    pub fn aead(msg: impl Into<String>) -> Self {
        Self::AeadError(msg.into())
    }

    pub fn kem(msg: impl Into<String>) -> Self {
        Self::KemError(msg.into())
    }

    pub fn hpke(msg: impl Into<String>) -> Self {
        Self::HpkeError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

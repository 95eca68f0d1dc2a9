//! # Core Error Taxonomy
//!
//! `SageError` is the single stable error surface the crate exposes to
//! callers outside the crypto/did/transport/keystore boundary. Lower layers
//! keep their own narrower enums (`crypto::CryptoError`, `did::DidError`,
//! `transport::TransportError`, `keystore::KeyStoreError`); this module wraps
//! each of them at the point where control crosses back out to an
//! application.
//!
//! No variant's `Display` text includes key material, plaintext, or
//! signatures — only identifiers (context ids, session ids, DIDs) and sizes.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SageError>;

/// Stable error taxonomy for the handshake and session subsystem.
///
/// Variant names are the identifiers callers are expected to match on;
/// the attached context is diagnostic only.
#[derive(Debug, Error)]
pub enum SageError {
    /// Signature verification failed, or the claimed sender DID resolved to
    /// an unknown or inactive agent.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A nonce or data-plane counter was already seen.
    #[error("replay detected: {0}")]
    Replay(String),

    /// A timestamp fell outside the configured clock-skew window, or a
    /// session outlived its idle TTL.
    #[error("expired: {0}")]
    Expired(String),

    /// Unexpected handshake phase, contextId mismatch, malformed canonical
    /// encoding, or transcript-hash mismatch.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The responder's selected algorithm was not present in the
    /// initiator's advertised set.
    #[error("algorithm downgrade rejected: {0}")]
    Downgrade(String),

    /// The DID resolver reported a transient failure; retriable by the
    /// caller.
    #[error("DID resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// The transport carrier failed to deliver or receive a message.
    #[error("transport error: {0}")]
    TransportError(String),

    /// An AEAD tag check failed.
    #[error("decryption failure")]
    DecryptionFailure,

    /// The session id referenced by an operation is unknown or has been
    /// closed.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A session exhausted its 64-bit send counter space.
    #[error("counter overflow on session {0}")]
    CounterOverflow(String),

    /// A resource quota (session table, per-peer handshake slots) was
    /// exceeded.
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// Per-peer abuse throttle tripped.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The session manager is shutting down and refuses new work.
    #[error("shutting down")]
    Shutdown,

    /// A lower-layer cryptographic primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] crate::crypto::error::CryptoError),

    /// A lower-layer DID resolution failed in a way not captured above.
    #[error("did error: {0}")]
    Did(#[from] crate::did::DidError),

    /// A lower-layer key store operation failed.
    #[error("key store error: {0}")]
    KeyStore(#[from] crate::keystore::KeyStoreError),
}

impl From<crate::transport::TransportError> for SageError {
    fn from(err: crate::transport::TransportError) -> Self {
        Self::TransportError(err.to_string())
    }
}

impl SageError {
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthFailed(msg.into())
    }

    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay(msg.into())
    }

    pub fn expired(msg: impl Into<String>) -> Self {
        Self::Expired(msg.into())
    }

    pub fn protocol_violation(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    pub fn downgrade(msg: impl Into<String>) -> Self {
        Self::Downgrade(msg.into())
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound(session_id.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }
}

//! # DID Resolver Interface
//!
//! Spec §4.2: `Resolve(did) -> DIDDocument | {NotFound, Inactive,
//! ResolverUnavailable}`. The core does not assume the underlying ledger is
//! live — the resolver may be backed by an in-memory registry, a local
//! cache, or an on-chain call; the core only ever sees this trait.

use std::fmt;
use std::time::{Duration, SystemTime};

use thiserror::Error;

use crate::crypto::kem::KemPublicKey;
use crate::crypto::sign::{Algorithm, VerifyingKey};

/// A decentralized identifier of the form `did:<method>:<network>:<address>`.
///
/// Immutable once constructed; this is the only identity the core trusts.
/// All handshake signatures are bound to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Did(String);

impl Did {
    /// Wrap a DID string. The core treats DIDs as opaque identifiers; it
    /// does not validate method-specific syntax beyond requiring a
    /// non-empty string with at least one `:` separator, matching the
    /// `did:<method>:<network>:<address>` shape from the data model.
    pub fn new(value: impl Into<String>) -> Result<Self, DidError> {
        let value = value.into();
        if value.is_empty() || value.matches(':').count() < 2 {
            return Err(DidError::Malformed(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The resolved document for a DID: its registered public keys and
/// liveness state.
#[derive(Debug, Clone)]
pub struct DidDocument {
    pub did: Did,
    pub signing_algorithm: Algorithm,
    pub signing_public_key: VerifyingKey,
    pub kem_public_key: KemPublicKey,
    pub active: bool,
    pub registered_at: SystemTime,
}

impl DidDocument {
    pub fn new(
        did: Did,
        signing_public_key: VerifyingKey,
        kem_public_key: KemPublicKey,
        active: bool,
        registered_at: SystemTime,
    ) -> Self {
        let signing_algorithm = signing_public_key.algorithm();
        Self {
            did,
            signing_algorithm,
            signing_public_key,
            kem_public_key,
            active,
            registered_at,
        }
    }
}

/// Errors the resolver contract can surface. `NotFound` is terminal;
/// `ResolverUnavailable` is retriable by the caller.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("malformed DID: {0}")]
    Malformed(String),

    #[error("DID not registered: {0}")]
    NotFound(String),

    #[error("DID is inactive: {0}")]
    Inactive(String),

    #[error("DID resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

/// External collaborator contract for resolving a DID to its registered
/// keys. Implementations may cache internally; `cache_ttl` reports the TTL
/// they apply so callers can reason about staleness, but enforcement of
/// that TTL is the resolver's responsibility, not the caller's.
pub trait DidResolver: Send + Sync {
    /// Resolve `did` to its registered document.
    fn resolve(&self, did: &Did) -> Result<DidDocument, DidError>;

    /// TTL the resolver applies to any internally cached documents. A
    /// resolver with no caching may return `Duration::ZERO`.
    fn cache_ttl(&self) -> Duration {
        Duration::ZERO
    }
}

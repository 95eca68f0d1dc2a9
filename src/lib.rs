//! # SAGE Core
//!
//! The DID-anchored handshake, HPKE bootstrap, and AEAD session management
//! subsystem for autonomous agent-to-agent communication.
//!
//! ## Security Architecture
//!
//! This crate is the root of trust for every encrypted session an agent
//! holds:
//! - Every handshake phase is signed under the initiating DID's registered
//!   key and verified against a resolved `DidDocument` before it is trusted.
//! - Session keys are derived from an ephemeral HPKE exchange, never from a
//!   long-term key directly, so compromising a long-term signing key alone
//!   does not expose past session traffic.
//! - Every secret-carrying type zeroizes on drop: shared secrets, session
//!   keys, and signing key material never outlive their last use in
//!   memory.
//!
//! ## Module Organization
//!
//! - [`crypto`] — primitive surface: hashing, HKDF, AEAD, X25519 KEM,
//!   the four signature algorithms, and the HPKE wrapper
//! - [`did`] — the `DidResolver` contract and resolved `DidDocument`
//! - [`transport`] — the `Transport` contract carrying `SecureMessage`
//!   envelopes between peers
//! - [`message`] — the wire data model and its canonical encoding
//! - [`handshake`] — the four-phase Initiator/Responder state machines
//! - [`hpke_bootstrap`] — stateless one-shot sealed messages to a DID,
//!   outside the handshake
//! - [`session`] — the `SessionManager`: install, encrypt, decrypt, close,
//!   sweep
//! - [`rate_limit`] — per-peer handshake concurrency and auth-failure
//!   throttling
//! - [`keystore`] — the `KeyStore` contract and a reference file-backed
//!   implementation
//! - [`config`] — `SageConfig`, the tunables every other module reads
//! - [`error`] — `SageError`, the stable error taxonomy this crate exposes
//! - [`testutil`] — in-memory `DidResolver`/`Transport` fixtures, behind
//!   `#[cfg(any(test, feature = "test-util"))]`
//!
//! ## Non-Goals
//!
//! This crate does not implement DID registration or ledger anchoring, key
//! rotation/recovery ceremonies, multi-device fan-out, or post-quantum key
//! exchange. See `DESIGN.md` for the full rationale.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

/// Cryptographic primitives: hashing, HKDF, AEAD, X25519 KEM, signatures, HPKE.
pub mod crypto;

/// Crate-wide error taxonomy.
pub mod error;

/// Runtime configuration (`SageConfig`).
pub mod config;

/// The `DidResolver` contract and resolved `DidDocument`.
pub mod did;

/// The `Transport` contract and `SecureMessage` envelope delivery.
pub mod transport;

/// Wire data model and canonical encoding.
pub mod message;

/// Four-phase DID-bound handshake state machines.
pub mod handshake;

/// Stateless one-shot HPKE-sealed messages addressed to a DID.
pub mod hpke_bootstrap;

/// AEAD session table: install, encrypt, decrypt, close, sweep.
pub mod session;

/// Per-peer handshake concurrency and authentication-failure throttling.
pub mod rate_limit;

/// Long-term identity key persistence.
pub mod keystore;

/// In-memory `DidResolver`/`Transport` fixtures for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use error::{Result, SageError};

//! # Cryptographic Primitives Module
//!
//! Sign/Verify, KEM key generation, HPKE seal/open/export, AEAD seal/open,
//! HKDF, SHA-256. Everything above this module (the handshake engine, HPKE
//! bootstrap, session manager) is built entirely on the types exposed here;
//! nothing outside `crypto::` touches a cipher, curve, or hash function
//! directly.
//!
//! ## Design Principles
//!
//! 1. **Type safety**: all key types are newtype wrappers preventing misuse.
//! 2. **Memory safety**: every secret-carrying type implements `Zeroize`.
//! 3. **One dispatch point per concern**: the signing module is a tagged
//!    `Algorithm` enum with one `sign`/`verify` match, not a `dyn Signer`
//!    hierarchy.
//!
//! ## Module Structure
//!
//! - `error` — unified error type for all crypto operations
//! - `hash` — SHA-256
//! - `kdf` — HKDF-SHA256 (protocol) and Argon2id (key-store passphrases)
//! - `aead` — ChaCha20-Poly1305 with the counter-based data-plane nonce
//! - `kem` — X25519 key encapsulation
//! - `sign` — Ed25519, ECDSA-secp256k1, ECDSA-P256, RSA-PSS-SHA256
//! - `hpke` — DHKEM(X25519,HKDF-SHA256)/HKDF-SHA256/ChaCha20-Poly1305 HPKE

pub mod error;

pub mod aead;
pub mod hash;
pub mod hpke;
pub mod kdf;
pub mod kem;
pub mod sign;

pub use error::{CryptoError, Result};

pub use hash::{sha256, HashOutput, Sha256Hasher};

pub use kdf::{hkdf, hkdf_fixed, Argon2idConfig, Argon2idKDF, DerivedKey, HkdfOutput};

pub use aead::{seal as aead_seal, open as aead_open, AeadAlgorithm, AeadKey, AeadNonce};

pub use kem::{
    diffie_hellman, generate_keypair as kem_generate_keypair, KemKeyPair, KemPublicKey,
    KemSecretKey, KemSharedSecret,
};

pub use sign::{sign, verify, Algorithm as SignAlgorithm, SigningKey, VerifyingKey};

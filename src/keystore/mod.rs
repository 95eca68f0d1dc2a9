//! # Key Store Contract
//!
//! `Store(id, keypair, passphrase)`, `Load(id, passphrase) -> keypair`,
//! `Delete(id)`, `List() -> [id]`, `Exists(id) -> bool`. The core requires
//! at-rest encryption of private key material but does not dictate on-disk
//! layout or file permissions beyond that.
//!
//! `FileKeyStore` is this crate's reference adapter: one file per key id,
//! private key bytes encrypted with ChaCha20-Poly1305 under an
//! Argon2id-stretched passphrase key, written with a shadow-write
//! discipline (write to a sibling temp file, `sync_all`, then atomically
//! rename over the target) so a crash mid-write never leaves a corrupt key
//! file.

mod file_store;

use thiserror::Error;

use crate::crypto::sign::{Algorithm, SigningKey, VerifyingKey};

pub use file_store::FileKeyStore;

/// A long-term identity key pair as the store persists it.
pub struct StoredKeyPair {
    pub id: String,
    pub algorithm: Algorithm,
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

/// Errors the key store contract can surface.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("incorrect passphrase for key {0}")]
    IncorrectPassphrase(String),

    #[error("key store I/O error: {0}")]
    Io(String),

    #[error("key store encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::error::CryptoError),
}

/// External collaborator contract for persisting long-term identity keys.
pub trait KeyStore {
    fn store(&self, id: &str, keypair: &StoredKeyPair, passphrase: &[u8]) -> Result<(), KeyStoreError>;
    fn load(&self, id: &str, passphrase: &[u8]) -> Result<StoredKeyPair, KeyStoreError>;
    fn delete(&self, id: &str) -> Result<(), KeyStoreError>;
    fn list(&self) -> Result<Vec<String>, KeyStoreError>;
    fn exists(&self, id: &str) -> Result<bool, KeyStoreError>;
}

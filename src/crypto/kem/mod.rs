//! # X25519 KEM Module
//!
//! Plain X25519 Diffie-Hellman key encapsulation, no post-quantum hybrid.
//! Keeps a newtype-per-key shape and zeroize discipline throughout.
//!
//! ## Components
//!
//! - [`KemPublicKey`]: 32-byte public key
//! - [`KemSecretKey`]: 32-byte secret key (zeroizes on drop)
//! - [`KemSharedSecret`]: 32-byte raw DH output (zeroizes on drop)
//! - [`KemKeyPair`]: public/secret pair
//! - [`generate_keypair`] / [`diffie_hellman`]: the two KEM operations

mod x25519;

pub use self::x25519::{diffie_hellman, generate_keypair};

use zeroize::{Zeroize, ZeroizeOnDrop};

/// X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KemPublicKey(pub [u8; 32]);

impl KemPublicKey {
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

impl std::fmt::Debug for KemPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("KemPublicKey")
            .field(&hex::encode(self.0))
            .finish()
    }
}

/// X25519 secret key (32 bytes). Zeroizes on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KemSecretKey(pub [u8; 32]);

impl KemSecretKey {
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

/// Raw X25519 Diffie-Hellman output (32 bytes). Zeroizes on drop.
///
/// This is consumed immediately by HKDF/HPKE; it is never itself used
/// directly as an AEAD key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KemSharedSecret(pub [u8; 32]);

impl KemSharedSecret {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// An ephemeral or long-term X25519 key pair.
pub struct KemKeyPair {
    pub public: KemPublicKey,
    pub secret: KemSecretKey,
}

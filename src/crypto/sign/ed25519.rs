//! Ed25519 signing, backed by `ed25519-dalek`. The default algorithm.

use ed25519_dalek::{Signature, Signer, SigningKey as DalekSigningKey, Verifier};
use rand::rngs::OsRng;

use crate::crypto::error::{CryptoError, Result};

pub struct Ed25519SigningKey(DalekSigningKey);

#[derive(Clone)]
pub struct Ed25519VerifyingKey(ed25519_dalek::VerifyingKey);

pub fn generate() -> (Ed25519SigningKey, Ed25519VerifyingKey) {
    let sk = DalekSigningKey::generate(&mut OsRng);
    let vk = sk.verifying_key();
    (Ed25519SigningKey(sk), Ed25519VerifyingKey(vk))
}

pub fn sign(key: &Ed25519SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    Ok(key.0.sign(message).to_bytes().to_vec())
}

pub fn verify(key: &Ed25519VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let sig_bytes: [u8; 64] = match signature.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let sig = Signature::from_bytes(&sig_bytes);
    key.0.verify(message, &sig).is_ok()
}

pub fn to_bytes(key: &Ed25519SigningKey) -> Vec<u8> {
    key.0.to_bytes().to_vec()
}

pub fn from_bytes(bytes: &[u8]) -> Result<Ed25519SigningKey> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
    Ok(Ed25519SigningKey(DalekSigningKey::from_bytes(&arr)))
}

pub fn verifying_to_bytes(key: &Ed25519VerifyingKey) -> Vec<u8> {
    key.0.to_bytes().to_vec()
}

pub fn verifying_from_bytes(bytes: &[u8]) -> Result<Ed25519VerifyingKey> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
    let vk = ed25519_dalek::VerifyingKey::from_bytes(&arr)
        .map_err(|_| CryptoError::internal("invalid Ed25519 public key"))?;
    Ok(Ed25519VerifyingKey(vk))
}

//! ECDSA over P-256, backed by `p256`. Raw 64-byte R||S, not DER.

use p256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey as P256SigningKeyImpl, VerifyingKey as P256VerifyingKeyImpl,
};
use rand::rngs::OsRng;

use crate::crypto::error::{CryptoError, Result};

pub struct P256SigningKey(P256SigningKeyImpl);

#[derive(Clone)]
pub struct P256VerifyingKey(P256VerifyingKeyImpl);

pub fn generate() -> (P256SigningKey, P256VerifyingKey) {
    let sk = P256SigningKeyImpl::random(&mut OsRng);
    let vk = *sk.verifying_key();
    (P256SigningKey(sk), P256VerifyingKey(vk))
}

pub fn sign(key: &P256SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let sig: Signature = key.0.sign(message);
    Ok(sig.to_bytes().to_vec())
}

pub fn verify(key: &P256VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let sig = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    key.0.verify(message, &sig).is_ok()
}

pub fn to_bytes(key: &P256SigningKey) -> Vec<u8> {
    key.0.to_bytes().to_vec()
}

pub fn from_bytes(bytes: &[u8]) -> Result<P256SigningKey> {
    P256SigningKeyImpl::from_slice(bytes)
        .map(P256SigningKey)
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })
}

pub fn verifying_to_bytes(key: &P256VerifyingKey) -> Vec<u8> {
    key.0.to_encoded_point(true).as_bytes().to_vec()
}

pub fn verifying_from_bytes(bytes: &[u8]) -> Result<P256VerifyingKey> {
    P256VerifyingKeyImpl::from_sec1_bytes(bytes)
        .map(P256VerifyingKey)
        .map_err(|_| CryptoError::internal("invalid P-256 public key"))
}

//! ECDSA over secp256k1, backed by `k256`. Produces raw 64-byte R||S
//! signatures, never DER.

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey as K256SigningKey, VerifyingKey as K256VerifyingKey,
};
use rand::rngs::OsRng;

use crate::crypto::error::{CryptoError, Result};

pub struct Secp256k1SigningKey(K256SigningKey);

#[derive(Clone)]
pub struct Secp256k1VerifyingKey(K256VerifyingKey);

pub fn generate() -> (Secp256k1SigningKey, Secp256k1VerifyingKey) {
    let sk = K256SigningKey::random(&mut OsRng);
    let vk = *sk.verifying_key();
    (Secp256k1SigningKey(sk), Secp256k1VerifyingKey(vk))
}

pub fn sign(key: &Secp256k1SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let sig: Signature = key.0.sign(message);
    Ok(sig.to_bytes().to_vec())
}

pub fn verify(key: &Secp256k1VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let sig = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    key.0.verify(message, &sig).is_ok()
}

pub fn to_bytes(key: &Secp256k1SigningKey) -> Vec<u8> {
    key.0.to_bytes().to_vec()
}

pub fn from_bytes(bytes: &[u8]) -> Result<Secp256k1SigningKey> {
    K256SigningKey::from_slice(bytes)
        .map(Secp256k1SigningKey)
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })
}

pub fn verifying_to_bytes(key: &Secp256k1VerifyingKey) -> Vec<u8> {
    key.0.to_encoded_point(true).as_bytes().to_vec()
}

pub fn verifying_from_bytes(bytes: &[u8]) -> Result<Secp256k1VerifyingKey> {
    K256VerifyingKey::from_sec1_bytes(bytes)
        .map(Secp256k1VerifyingKey)
        .map_err(|_| CryptoError::internal("invalid secp256k1 public key"))
}

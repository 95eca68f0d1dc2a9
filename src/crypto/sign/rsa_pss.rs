//! RSA-PSS-SHA256 signing, backed by `rsa`'s `pss` module.

use rand::rngs::OsRng;
use rsa::{
    pss::{BlindedSigningKey, Signature, VerifyingKey as RsaPssVerifyingKeyImpl},
    signature::{RandomizedSigner, SignatureEncoding, Verifier},
    RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;

use crate::crypto::error::{CryptoError, Result};

/// Key size chosen for new identities; existing keys of any size the `rsa`
/// crate accepts can still be loaded via `from_bytes`.
const KEY_BITS: usize = 2048;

pub struct RsaPssSigningKey(RsaPrivateKey);

#[derive(Clone)]
pub struct RsaPssVerifyingKey(RsaPublicKey);

pub fn generate() -> Result<(RsaPssSigningKey, RsaPssVerifyingKey)> {
    let private = RsaPrivateKey::new(&mut OsRng, KEY_BITS)
        .map_err(|e| CryptoError::internal(format!("RSA key generation failed: {e}")))?;
    let public = RsaPublicKey::from(&private);
    Ok((RsaPssSigningKey(private), RsaPssVerifyingKey(public)))
}

pub fn sign(key: &RsaPssSigningKey, message: &[u8]) -> Result<Vec<u8>> {
    let signing_key = BlindedSigningKey::<Sha256>::new(key.0.clone());
    let signature = signing_key.sign_with_rng(&mut OsRng, message);
    Ok(signature.to_vec())
}

pub fn verify(key: &RsaPssVerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let verifying_key = RsaPssVerifyingKeyImpl::<Sha256>::new(key.0.clone());
    let sig = match Signature::try_from(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    verifying_key.verify(message, &sig).is_ok()
}

pub fn to_bytes(key: &RsaPssSigningKey) -> Vec<u8> {
    use rsa::pkcs8::EncodePrivateKey;
    key.0
        .to_pkcs8_der()
        .expect("valid RSA private key always encodes")
        .as_bytes()
        .to_vec()
}

pub fn from_bytes(bytes: &[u8]) -> Result<RsaPssSigningKey> {
    use rsa::pkcs8::DecodePrivateKey;
    RsaPrivateKey::from_pkcs8_der(bytes)
        .map(RsaPssSigningKey)
        .map_err(|e| CryptoError::internal(format!("invalid RSA private key: {e}")))
}

pub fn verifying_to_bytes(key: &RsaPssVerifyingKey) -> Vec<u8> {
    use rsa::pkcs8::EncodePublicKey;
    key.0
        .to_public_key_der()
        .expect("valid RSA public key always encodes")
        .as_bytes()
        .to_vec()
}

pub fn verifying_from_bytes(bytes: &[u8]) -> Result<RsaPssVerifyingKey> {
    use rsa::pkcs8::DecodePublicKey;
    RsaPublicKey::from_public_key_der(bytes)
        .map(RsaPssVerifyingKey)
        .map_err(|e| CryptoError::internal(format!("invalid RSA public key: {e}")))
}

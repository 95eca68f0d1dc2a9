//! ChaCha20-Poly1305 seal/open backed by the `chacha20poly1305` crate.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};

use super::{AeadKey, AeadNonce};
use crate::crypto::error::{CryptoError, Result};

/// Encrypt `plaintext` under `key`/`nonce`, binding `aad`. Returns
/// ciphertext with the 16-byte Poly1305 tag appended, matching the
/// `chacha20poly1305` crate's combined-mode output.
pub fn seal(key: &AeadKey, nonce: &AeadNonce, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(nonce.as_bytes());
    cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::aead("seal failed"))
}

/// Decrypt `ciphertext` (with trailing tag) under `key`/`nonce`, checking
/// `aad`. Returns `CryptoError::DecryptionFailure` on tag mismatch — the
/// one error variant this function can fail with, since the inputs are
/// already length-validated by their newtype constructors.
pub fn open(key: &AeadKey, nonce: &AeadNonce, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(nonce.as_bytes());
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::aead::DIRECTION_OUTBOUND;

    fn key() -> AeadKey {
        AeadKey::from_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn roundtrip_succeeds() {
        let k = key();
        let nonce = AeadNonce::from_counter(0, DIRECTION_OUTBOUND);
        let ct = seal(&k, &nonce, b"aad", b"hello").unwrap();
        let pt = open(&k, &nonce, b"aad", &ct).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn wrong_aad_fails() {
        let k = key();
        let nonce = AeadNonce::from_counter(0, DIRECTION_OUTBOUND);
        let ct = seal(&k, &nonce, b"aad-a", b"hello").unwrap();
        assert!(open(&k, &nonce, b"aad-b", &ct).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let k = key();
        let nonce = AeadNonce::from_counter(0, DIRECTION_OUTBOUND);
        let mut ct = seal(&k, &nonce, b"aad", b"hello").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert!(matches!(
            open(&k, &nonce, b"aad", &ct),
            Err(CryptoError::DecryptionFailure)
        ));
    }

    #[test]
    fn wrong_counter_fails() {
        let k = key();
        let ct = seal(&k, &AeadNonce::from_counter(0, DIRECTION_OUTBOUND), b"", b"hello").unwrap();
        let result = open(&k, &AeadNonce::from_counter(1, DIRECTION_OUTBOUND), b"", &ct);
        assert!(result.is_err());
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let k = key();
        let nonce = AeadNonce::from_counter(5, DIRECTION_OUTBOUND);
        let ct = seal(&k, &nonce, b"sage-hs-proof", b"").unwrap();
        assert_eq!(open(&k, &nonce, b"sage-hs-proof", &ct).unwrap(), b"");
    }
}

//! HKDF-SHA256 implementation backed by the `hkdf` crate.
//!
//! This is the protocol-level key derivation function: session send/recv
//! keys, HPKE exports, and handshake proof-of-possession keys all go
//! through here. Argon2id (the sibling module) is reserved for stretching
//! low-entropy passphrases in the reference key store; it is never used on
//! the handshake hot path.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::error::{CryptoError, Result};

/// Output of an HKDF expansion. Zeroizes on drop since callers typically use
/// this directly as an AEAD key or export secret.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct HkdfOutput(Vec<u8>);

impl HkdfOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for HkdfOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HkdfOutput")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Extract-and-expand HKDF-SHA256: `HKDF(ikm, salt, info, length) -> bytes`.
///
/// `salt` may be empty — RFC 5869 treats an empty salt as a string of
/// `HashLen` zero bytes, which is what `Hkdf::new` with `None` implements.
pub fn hkdf(ikm: &[u8], salt: &[u8], info: &[u8], length: usize) -> Result<HkdfOutput> {
    let salt_opt = if salt.is_empty() { None } else { Some(salt) };
    let hk = Hkdf::<Sha256>::new(salt_opt, ikm);
    let mut okm = vec![0u8; length];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::kdf(format!("HKDF expand failed for length {}", length)))?;
    Ok(HkdfOutput(okm))
}

/// Derive a fixed-size key, the common case for session send/recv keys.
pub fn hkdf_fixed<const N: usize>(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; N]> {
    let out = hkdf(ikm, salt, info, N)?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(out.as_bytes());
    Ok(buf)
}

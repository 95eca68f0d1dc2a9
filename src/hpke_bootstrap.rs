//! # One-Shot HPKE Bootstrap
//!
//! Spec §4.5: a stateless "seal a message to a DID" convenience built on
//! top of [`crate::crypto::hpke`], used outside the four-phase handshake
//! whenever an agent needs to deliver a single encrypted message to a peer
//! it has never shaken hands with (e.g. an out-of-band introduction). This
//! lives above `crypto::hpke` because it needs [`DidResolver`] access to
//! look up the recipient's registered KEM key; `crypto::hpke` itself only
//! ever sees raw KEM keys.
//!
//! The HPKE `info` string binds the recipient's DID, so a `SealedMessage`
//! produced for one DID cannot be replayed as though it were addressed to
//! another, even if both share a KEM key by coincidence.

use crate::crypto::hpke::{self, EncappedKey};
use crate::crypto::kem::KemSecretKey;
use crate::did::{Did, DidResolver};
use crate::error::SageError;

/// The two fields a sealed one-shot message carries on the wire.
#[derive(Debug, Clone)]
pub struct SealedMessage {
    pub encapsulated_key: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

fn bootstrap_info(recipient: &Did) -> Vec<u8> {
    let mut info = hpke::INFO_VERSION.to_vec();
    info.extend_from_slice(b"bootstrap");
    info.extend_from_slice(recipient.as_str().as_bytes());
    info
}

/// Resolve `recipient`'s registered KEM key and seal `plaintext` to it.
pub fn seal_to_did(
    resolver: &dyn DidResolver,
    recipient: &Did,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<SealedMessage, SageError> {
    let document = resolver.resolve(recipient)?;
    let info = bootstrap_info(recipient);
    let (encapped, ctx) = hpke::sender_setup(&document.kem_public_key, &info)?;
    let ciphertext = ctx.seal(aad, plaintext)?;
    Ok(SealedMessage {
        encapsulated_key: encapped.to_bytes(),
        ciphertext,
    })
}

/// Open a [`SealedMessage`] addressed to `self_did`, using the matching
/// long-term KEM secret key.
pub fn open_from_did(
    own_secret: &KemSecretKey,
    self_did: &Did,
    aad: &[u8],
    sealed: &SealedMessage,
) -> Result<Vec<u8>, SageError> {
    let info = bootstrap_info(self_did);
    let encapped = EncappedKey::from_bytes(&sealed.encapsulated_key)?;
    let ctx = hpke::receiver_setup(&encapped, own_secret, &info)?;
    Ok(ctx.open(aad, &sealed.ciphertext)?)
}

//! # HPKE Layer
//!
//! A thin wrapper around the `hpke` crate fixing one ciphersuite:
//! `DHKEM(X25519, HKDF-SHA256)`, KDF `HKDF-SHA256`, AEAD
//! `ChaCha20-Poly1305`, base mode (no PSK, no sender authentication — the
//! handshake engine binds identity via the surrounding DID signature, not
//! via HPKE's own auth mode).
//!
//! `sender_setup`/`receiver_setup` are used directly by the handshake
//! engine for phases 3 and 4. The one-shot "stateless message to a DID"
//! convenience lives one layer up in [`crate::hpke_bootstrap`], since it
//! needs a `DidResolver` to look up the recipient's KEM key — this module
//! only knows about raw KEM public/private keys.

use hpke::{
    aead::ChaCha20Poly1305 as HpkeAead, kdf::HkdfSha256 as HpkeKdf, kem::X25519HkdfSha256 as HpkeKem,
    Deserializable, OpModeR, OpModeS, Serializable,
};
use rand::rngs::OsRng;

use crate::crypto::error::{CryptoError, Result};
use crate::crypto::kem::{KemPublicKey, KemSecretKey};

/// Protocol version tag mixed into every HPKE `info` string, so a future
/// protocol revision cannot be replayed against an older implementation.
pub const INFO_VERSION: &[u8] = b"sage-hpke-v1";

/// An encapsulated key produced by [`sender_setup`], sent alongside the
/// ciphertext so the receiver can run [`receiver_setup`].
pub struct EncappedKey(<HpkeKem as hpke::Kem>::EncappedKey);

impl EncappedKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(
            Deserializable::from_bytes(bytes)
                .map_err(|e| CryptoError::hpke(format!("invalid encapped key: {e}")))?,
        ))
    }
}

/// Sender-side HPKE context. `seal` consumes it (HPKE contexts are
/// single-direction and the handshake only ever seals one message per
/// context), `export` may be called any number of times beforehand.
pub struct SenderContext(hpke::aead::AeadCtxS<HpkeAead, HpkeKdf, HpkeKem>);

/// Receiver-side HPKE context, symmetric to [`SenderContext`].
pub struct ReceiverContext(hpke::aead::AeadCtxR<HpkeAead, HpkeKdf, HpkeKem>);

fn to_hpke_pubkey(key: &KemPublicKey) -> Result<<HpkeKem as hpke::Kem>::PublicKey> {
    Deserializable::from_bytes(key.as_bytes())
        .map_err(|e| CryptoError::hpke(format!("invalid recipient KEM key: {e}")))
}

fn to_hpke_privkey(key: &KemSecretKey) -> Result<<HpkeKem as hpke::Kem>::PrivateKey> {
    Deserializable::from_bytes(key.as_bytes())
        .map_err(|e| CryptoError::hpke(format!("invalid local KEM key: {e}")))
}

/// `SenderSetup(peerKEMPub, info) -> (enc, ctx)`. Base mode HPKE encapsulation
/// against the peer's KEM public key.
pub fn sender_setup(peer_public: &KemPublicKey, info: &[u8]) -> Result<(EncappedKey, SenderContext)> {
    let peer_key = to_hpke_pubkey(peer_public)?;
    let (encapped, ctx) =
        hpke::setup_sender::<HpkeAead, HpkeKdf, HpkeKem, _>(&OpModeS::Base, &peer_key, info, &mut OsRng)
            .map_err(|e| CryptoError::hpke(format!("sender setup failed: {e}")))?;
    Ok((EncappedKey(encapped), SenderContext(ctx)))
}

/// `ReceiverSetup(enc, myKEMPriv, info) -> ctx`.
pub fn receiver_setup(
    encapped: &EncappedKey,
    own_secret: &KemSecretKey,
    info: &[u8],
) -> Result<ReceiverContext> {
    let secret = to_hpke_privkey(own_secret)?;
    let ctx = hpke::setup_receiver::<HpkeAead, HpkeKdf, HpkeKem>(&OpModeR::Base, &secret, &encapped.0, info)
        .map_err(|e| CryptoError::hpke(format!("receiver setup failed: {e}")))?;
    Ok(ReceiverContext(ctx))
}

impl SenderContext {
    /// `Seal(aad, pt) -> ct`. Consumes the context: one seal per HPKE
    /// context is all the handshake protocol ever needs (the
    /// proof-of-possession ciphertext in phase 3).
    pub fn seal(mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut buf = plaintext.to_vec();
        let tag = self
            .0
            .seal_in_place_detached(&mut buf, aad)
            .map_err(|e| CryptoError::hpke(format!("seal failed: {e}")))?;
        buf.extend_from_slice(&tag.to_bytes());
        Ok(buf)
    }

    /// `Export(label, L) -> bytes`. May be called before [`Self::seal`]
    /// consumes the context; used to derive the shared secret that phase 3
    /// hands to the session manager.
    pub fn export(&self, label: &[u8], length: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; length];
        self.0
            .export(label, &mut out)
            .map_err(|e| CryptoError::hpke(format!("export failed: {e}")))?;
        Ok(out)
    }
}

impl ReceiverContext {
    /// `Open(aad, ct) -> pt`. `ct` must end with the 16-byte Poly1305 tag
    /// produced by [`SenderContext::seal`].
    pub fn open(mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        // ChaCha20-Poly1305's authentication tag is always 16 bytes; the
        // ciphersuite is fixed, so the length is never negotiated.
        let tag_len = 16;
        if ciphertext.len() < tag_len {
            return Err(CryptoError::DecryptionFailure);
        }
        let (body, tag_bytes) = ciphertext.split_at(ciphertext.len() - tag_len);
        let tag: hpke::aead::AeadTag<HpkeAead> =
            Deserializable::from_bytes(tag_bytes).map_err(|_| CryptoError::DecryptionFailure)?;
        let mut buf = body.to_vec();
        self.0
            .open_in_place_detached(&mut buf, aad, &tag)
            .map_err(|_| CryptoError::DecryptionFailure)?;
        Ok(buf)
    }

    pub fn export(&self, label: &[u8], length: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; length];
        self.0
            .export(label, &mut out)
            .map_err(|e| CryptoError::hpke(format!("export failed: {e}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kem::generate_keypair;

    #[test]
    fn seal_open_roundtrip() {
        let recipient = generate_keypair();
        let info = b"sage-hs-v1test-context";

        let (encapped, sender_ctx) = sender_setup(&recipient.public, info).unwrap();
        let ct = sender_ctx.seal(b"aad", b"hello hpke").unwrap();

        let receiver_ctx = receiver_setup(&encapped, &recipient.secret, info).unwrap();
        let pt = receiver_ctx.open(b"aad", &ct).unwrap();

        assert_eq!(pt, b"hello hpke");
    }

    #[test]
    fn export_matches_between_sender_and_receiver() {
        let recipient = generate_keypair();
        let info = b"sage-hs-v1export-test";

        let (encapped, sender_ctx) = sender_setup(&recipient.public, info).unwrap();
        let sender_export = sender_ctx.export(b"sage-shared", 32).unwrap();

        let receiver_ctx = receiver_setup(&encapped, &recipient.secret, info).unwrap();
        let receiver_export = receiver_ctx.export(b"sage-shared", 32).unwrap();

        assert_eq!(sender_export, receiver_export);
    }

    #[test]
    fn tampered_aad_fails_to_open() {
        let recipient = generate_keypair();
        let info = b"sage-hs-v1tamper-test";

        let (encapped, sender_ctx) = sender_setup(&recipient.public, info).unwrap();
        let ct = sender_ctx.seal(b"aad-a", b"hello").unwrap();

        let receiver_ctx = receiver_setup(&encapped, &recipient.secret, info).unwrap();
        assert!(receiver_ctx.open(b"aad-b", &ct).is_err());
    }

    #[test]
    fn wrong_recipient_key_fails_to_open() {
        let recipient = generate_keypair();
        let other = generate_keypair();
        let info = b"sage-hs-v1wrong-key";

        let (encapped, sender_ctx) = sender_setup(&recipient.public, info).unwrap();
        let ct = sender_ctx.seal(b"aad", b"hello").unwrap();

        let receiver_ctx = receiver_setup(&encapped, &other.secret, info).unwrap();
        assert!(receiver_ctx.open(b"aad", &ct).is_err());
    }

    #[test]
    fn encapped_key_serializes_roundtrip() {
        let recipient = generate_keypair();
        let (encapped, _ctx) = sender_setup(&recipient.public, b"sage-hs-v1serde").unwrap();
        let bytes = encapped.to_bytes();
        let back = EncappedKey::from_bytes(&bytes).unwrap();
        assert_eq!(back.to_bytes(), bytes);
    }
}

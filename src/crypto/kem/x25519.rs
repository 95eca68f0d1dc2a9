//! X25519 key generation and Diffie-Hellman, backed by `x25519-dalek`.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use super::{KemKeyPair, KemPublicKey, KemSecretKey, KemSharedSecret};
use crate::crypto::error::Result;

/// Generate a fresh X25519 key pair using the OS RNG. Used both for
/// long-term KEM identity keys and for the ephemeral keys each side
/// generates during phases 2 and 3 of the handshake.
pub fn generate_keypair() -> KemKeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    KemKeyPair {
        public: KemPublicKey(*public.as_bytes()),
        secret: KemSecretKey(secret.to_bytes()),
    }
}

/// Perform X25519 Diffie-Hellman: `secret * public -> shared secret`.
///
/// The raw output is never used directly as a key; callers always route it
/// through HKDF or HPKE's `Export`.
pub fn diffie_hellman(secret: &KemSecretKey, public: &KemPublicKey) -> Result<KemSharedSecret> {
    let secret = StaticSecret::from(secret.0);
    let public = PublicKey::from(public.0);
    let shared = secret.diffie_hellman(&public);
    Ok(KemSharedSecret(*shared.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_are_unique() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(a.public.as_bytes(), b.public.as_bytes());
    }

    #[test]
    fn dh_is_symmetric() {
        let alice = generate_keypair();
        let bob = generate_keypair();

        let ss_a = diffie_hellman(&alice.secret, &bob.public).unwrap();
        let ss_b = diffie_hellman(&bob.secret, &alice.public).unwrap();

        assert_eq!(ss_a.as_bytes(), ss_b.as_bytes());
    }

    #[test]
    fn different_peers_produce_different_secrets() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let carol = generate_keypair();

        let ss_ab = diffie_hellman(&alice.secret, &bob.public).unwrap();
        let ss_ac = diffie_hellman(&alice.secret, &carol.public).unwrap();

        assert_ne!(ss_ab.as_bytes(), ss_ac.as_bytes());
    }
}

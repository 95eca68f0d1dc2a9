//! # Signing Module
//!
//! Spec §4.1 requires four signature algorithms (Ed25519 default, ECDSA
//! over secp256k1 and P-256 both as raw 64-byte R||S, and RSA-PSS-SHA256)
//! behind one `Sign`/`Verify` pair. Per the design notes ("dynamic dispatch
//! over signature algorithms... represent as a tagged variant; dispatch in
//! one place via a small table; avoid virtual-method hierarchies"), this
//! module is a tagged `Algorithm` enum plus `SigningKey`/`VerifyingKey`
//! enums that match on it once, here, rather than a `dyn Signer` trait
//! object hierarchy.

mod ed25519;
mod p256;
mod rsa_pss;
mod secp256k1;

use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::crypto::error::{CryptoError, Result};

/// Signature algorithm tag, serialized in `KeyPair`/`DIDDocument` as a
/// plain string so it round-trips through canonical JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "Ed25519")]
    Ed25519,
    #[serde(rename = "ECDSA-secp256k1")]
    EcdsaSecp256k1,
    #[serde(rename = "ECDSA-P256")]
    EcdsaP256,
    #[serde(rename = "RSA-PSS-SHA256")]
    RsaPssSha256,
}

impl Algorithm {
    fn name(self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519",
            Self::EcdsaSecp256k1 => "ECDSA-secp256k1",
            Self::EcdsaP256 => "ECDSA-P256",
            Self::RsaPssSha256 => "RSA-PSS-SHA256",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A signing (private) key, tagged by algorithm. Zeroizes on drop.
#[derive(ZeroizeOnDrop)]
pub enum SigningKey {
    Ed25519(#[zeroize(skip)] ed25519::Ed25519SigningKey),
    EcdsaSecp256k1(#[zeroize(skip)] secp256k1::Secp256k1SigningKey),
    EcdsaP256(#[zeroize(skip)] p256::P256SigningKey),
    RsaPssSha256(#[zeroize(skip)] rsa_pss::RsaPssSigningKey),
}

/// A verifying (public) key, tagged by algorithm.
#[derive(Clone)]
pub enum VerifyingKey {
    Ed25519(ed25519::Ed25519VerifyingKey),
    EcdsaSecp256k1(secp256k1::Secp256k1VerifyingKey),
    EcdsaP256(p256::P256VerifyingKey),
    RsaPssSha256(rsa_pss::RsaPssVerifyingKey),
}

impl SigningKey {
    /// Generate a fresh key pair for the given algorithm.
    pub fn generate(algorithm: Algorithm) -> Result<(Self, VerifyingKey)> {
        match algorithm {
            Algorithm::Ed25519 => {
                let (sk, vk) = ed25519::generate();
                Ok((Self::Ed25519(sk), VerifyingKey::Ed25519(vk)))
            }
            Algorithm::EcdsaSecp256k1 => {
                let (sk, vk) = secp256k1::generate();
                Ok((Self::EcdsaSecp256k1(sk), VerifyingKey::EcdsaSecp256k1(vk)))
            }
            Algorithm::EcdsaP256 => {
                let (sk, vk) = p256::generate();
                Ok((Self::EcdsaP256(sk), VerifyingKey::EcdsaP256(vk)))
            }
            Algorithm::RsaPssSha256 => {
                let (sk, vk) = rsa_pss::generate()?;
                Ok((Self::RsaPssSha256(sk), VerifyingKey::RsaPssSha256(vk)))
            }
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Ed25519(_) => Algorithm::Ed25519,
            Self::EcdsaSecp256k1(_) => Algorithm::EcdsaSecp256k1,
            Self::EcdsaP256(_) => Algorithm::EcdsaP256,
            Self::RsaPssSha256(_) => Algorithm::RsaPssSha256,
        }
    }

    /// Serialize the private key material to raw bytes (PKCS#8 DER for RSA,
    /// raw scalar for the curve algorithms) for the key store to encrypt
    /// at rest.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(sk) => ed25519::to_bytes(sk),
            Self::EcdsaSecp256k1(sk) => secp256k1::to_bytes(sk),
            Self::EcdsaP256(sk) => p256::to_bytes(sk),
            Self::RsaPssSha256(sk) => rsa_pss::to_bytes(sk),
        }
    }

    pub fn from_bytes(algorithm: Algorithm, bytes: &[u8]) -> Result<Self> {
        Ok(match algorithm {
            Algorithm::Ed25519 => Self::Ed25519(ed25519::from_bytes(bytes)?),
            Algorithm::EcdsaSecp256k1 => Self::EcdsaSecp256k1(secp256k1::from_bytes(bytes)?),
            Algorithm::EcdsaP256 => Self::EcdsaP256(p256::from_bytes(bytes)?),
            Algorithm::RsaPssSha256 => Self::RsaPssSha256(rsa_pss::from_bytes(bytes)?),
        })
    }
}

/// Sign `message` with `key`. Dispatches once, here, to the per-algorithm
/// implementation; no virtual call.
pub fn sign(key: &SigningKey, message: &[u8]) -> Result<Vec<u8>> {
    match key {
        SigningKey::Ed25519(sk) => ed25519::sign(sk, message),
        SigningKey::EcdsaSecp256k1(sk) => secp256k1::sign(sk, message),
        SigningKey::EcdsaP256(sk) => p256::sign(sk, message),
        SigningKey::RsaPssSha256(sk) => rsa_pss::sign(sk, message),
    }
}

/// Verify `signature` over `message` under `key`.
///
/// Returns `Ok(())` on success and `CryptoError::InvalidSignature` on any
/// verification failure — callers never learn more than pass/fail.
pub fn verify(key: &VerifyingKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let ok = match key {
        VerifyingKey::Ed25519(vk) => ed25519::verify(vk, message, signature),
        VerifyingKey::EcdsaSecp256k1(vk) => secp256k1::verify(vk, message, signature),
        VerifyingKey::EcdsaP256(vk) => p256::verify(vk, message, signature),
        VerifyingKey::RsaPssSha256(vk) => rsa_pss::verify(vk, message, signature),
    };
    if ok {
        Ok(())
    } else {
        Err(CryptoError::InvalidSignature)
    }
}

impl VerifyingKey {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Ed25519(_) => Algorithm::Ed25519,
            Self::EcdsaSecp256k1(_) => Algorithm::EcdsaSecp256k1,
            Self::EcdsaP256(_) => Algorithm::EcdsaP256,
            Self::RsaPssSha256(_) => Algorithm::RsaPssSha256,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(vk) => ed25519::verifying_to_bytes(vk),
            Self::EcdsaSecp256k1(vk) => secp256k1::verifying_to_bytes(vk),
            Self::EcdsaP256(vk) => p256::verifying_to_bytes(vk),
            Self::RsaPssSha256(vk) => rsa_pss::verifying_to_bytes(vk),
        }
    }

    pub fn from_bytes(algorithm: Algorithm, bytes: &[u8]) -> Result<Self> {
        Ok(match algorithm {
            Algorithm::Ed25519 => Self::Ed25519(ed25519::verifying_from_bytes(bytes)?),
            Algorithm::EcdsaSecp256k1 => {
                Self::EcdsaSecp256k1(secp256k1::verifying_from_bytes(bytes)?)
            }
            Algorithm::EcdsaP256 => Self::EcdsaP256(p256::verifying_from_bytes(bytes)?),
            Algorithm::RsaPssSha256 => Self::RsaPssSha256(rsa_pss::verifying_from_bytes(bytes)?),
        })
    }
}

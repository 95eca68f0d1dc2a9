//! SHA-256 implementation backed by `sha2`.

use sha2::{Digest, Sha256};

use super::HashOutput;

/// One-shot SHA-256 over a byte slice.
pub fn sha256(data: &[u8]) -> HashOutput {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    HashOutput::from_bytes(out)
}

/// Incremental SHA-256 hasher for multi-part inputs (e.g. transcript
/// accumulation across handshake phases) without requiring the caller to
/// concatenate buffers up front.
#[derive(Default)]
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn finalize(self) -> HashOutput {
        let digest = self.inner.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        HashOutput::from_bytes(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_vector() {
        let hash = sha256(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn incremental_matches_one_shot() {
        let one_shot = sha256(b"sage-hs-v1 transcript");
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"sage-hs-v1 ").update(b"transcript");
        assert_eq!(one_shot, hasher.finalize());
    }

    #[test]
    fn distinct_inputs_produce_distinct_hashes() {
        assert_ne!(sha256(b"a"), sha256(b"b"));
    }
}

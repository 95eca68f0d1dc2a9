//! # Argon2id Key Derivation Implementation
//!
//! Provides Argon2id KDF functionality with secure default parameters
//! following OWASP 2024 recommendations.
//!
//! ## Security Properties
//!
//! - Memory-hard function resistant to GPU/ASIC attacks
//! - Configurable memory, time, and parallelism costs
//! - Salt requirement (minimum 16 bytes) to prevent rainbow tables
//! - All derived keys implement `Zeroize` for automatic memory cleanup
//!
//! ## RFC 9106 Compliance
//!
//! This implementation follows RFC 9106 (Argon2 Memory-Hard Function
//! for Password Hashing and Proof-of-Work Applications).

use super::{Argon2idConfig, DerivedKey};
use crate::crypto::error::{CryptoError, Result};
use argon2::{Algorithm, Argon2, Params, Version};

/// Minimum salt length in bytes (RFC 9106 recommendation)
pub const MIN_SALT_LENGTH: usize = 16;

/// Argon2id key derivation function.
///
/// Provides a secure, memory-hard key derivation function suitable
/// for deriving cryptographic keys from passwords or other low-entropy
/// input material.
///
/// # Security Considerations
///
/// - Always use a unique, random salt (at least 16 bytes)
/// - Use the default OWASP 2024 parameters unless you have specific requirements
/// - The derived key automatically zeroizes on drop
///
/// # Example
///
/// ```
/// use sage_core::crypto::kdf::{Argon2idKDF, Argon2idConfig};
///
/// let kdf = Argon2idKDF::new();
/// let salt = [0u8; 16]; // In production, use a random salt!
/// let password = b"secure password";
///
/// let derived = kdf.derive_key(password, &salt).unwrap();
/// assert_eq!(derived.len(), 32);
/// ```
pub struct Argon2idKDF {
    config: Argon2idConfig,
}

impl Argon2idKDF {
    /// Create a new Argon2id KDF with OWASP 2024 default parameters.
    ///
    /// Default parameters:
    /// - Memory: 64 MB (`m_cost = 65536`)
    /// - Iterations: 3 (`t_cost = 3`)
    /// - Parallelism: 4 (`p_cost = 4`)
    /// - Output length: 32 bytes
    pub fn new() -> Self {
        Self {
            config: Argon2idConfig::default(),
        }
    }

    /// Create a new Argon2id KDF with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KdfError` if:
    /// - `m_cost` < 8192 (8 MB minimum)
    /// - `t_cost` < 1
    /// - `output_len` < 16 bytes
    ///
    /// # Example
    ///
    /// ```
    /// use sage_core::crypto::kdf::{Argon2idKDF, Argon2idConfig};
    ///
    /// let config = Argon2idConfig::new(32 * 1024, 2, 2, 32);
    /// let kdf = Argon2idKDF::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: Argon2idConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Argon2idConfig {
        &self.config
    }

    /// Derive a key from password and salt.
    ///
    /// # Arguments
    ///
    /// - `password`: The input key material (password, passphrase, etc.)
    /// - `salt`: A unique salt value (minimum 16 bytes, should be random)
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if salt is shorter than 16 bytes.
    /// Returns `CryptoError::KdfError` if key derivation fails.
    ///
    /// # Example
    ///
    /// ```
    /// use sage_core::crypto::kdf::Argon2idKDF;
    /// use rand::RngCore;
    ///
    /// let kdf = Argon2idKDF::new();
    ///
    /// // Generate a random salt
    /// let mut salt = [0u8; 16];
    /// rand::thread_rng().fill_bytes(&mut salt);
    ///
    /// let derived = kdf.derive_key(b"my password", &salt).unwrap();
    /// assert_eq!(derived.len(), 32);
    /// ```
    pub fn derive_key(&self, password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
        // Validate salt length
        if salt.len() < MIN_SALT_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_SALT_LENGTH,
                actual: salt.len(),
            });
        }

        // Build Argon2id parameters
        let params = Params::new(
            self.config.m_cost,
            self.config.t_cost,
            self.config.p_cost,
            Some(self.config.output_len),
        )
        .map_err(|e| CryptoError::kdf(format!("Invalid Argon2id parameters: {}", e)))?;

        // Create Argon2id context
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Derive the key
        let mut output = vec![0u8; self.config.output_len];
        argon2
            .hash_password_into(password, salt, &mut output)
            .map_err(|e| CryptoError::kdf(format!("Key derivation failed: {}", e)))?;

        Ok(DerivedKey(output))
    }

    /// Derive a key with a custom output length.
    ///
    /// This method allows specifying the output length at call time,
    /// overriding the configured default.
    ///
    /// # Arguments
    ///
    /// - `password`: The input key material
    /// - `salt`: A unique salt value (minimum 16 bytes)
    /// - `output_len`: Desired output length in bytes (minimum 16)
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if salt is shorter than 16 bytes.
    /// Returns `CryptoError::KdfError` if output_len < 16 or key derivation fails.
    pub fn derive_key_with_length(
        &self,
        password: &[u8],
        salt: &[u8],
        output_len: usize,
    ) -> Result<DerivedKey> {
        // Validate salt length
        if salt.len() < MIN_SALT_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_SALT_LENGTH,
                actual: salt.len(),
            });
        }

        // Validate output length
        if output_len < 16 {
            return Err(CryptoError::kdf(format!(
                "Output length too short: {} bytes (minimum 16)",
                output_len
            )));
        }

        // Build Argon2id parameters
        let params = Params::new(
            self.config.m_cost,
            self.config.t_cost,
            self.config.p_cost,
            Some(output_len),
        )
        .map_err(|e| CryptoError::kdf(format!("Invalid Argon2id parameters: {}", e)))?;

        // Create Argon2id context
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Derive the key
        let mut output = vec![0u8; output_len];
        argon2
            .hash_password_into(password, salt, &mut output)
            .map_err(|e| CryptoError::kdf(format!("Key derivation failed: {}", e)))?;

        Ok(DerivedKey(output))
    }
}

impl Default for Argon2idKDF {
    fn default() -> Self {
        Self::new()
    }
}


// ── Property-based tests (proptest) ─────────────────────────────────

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Derived key length matches configured output length
        #[test]
        fn prop_output_length_matches_config(
            password in prop::collection::vec(any::<u8>(), 0..256),
            salt in prop::collection::vec(any::<u8>(), 16..64),
            output_len in 16usize..128,
        ) {
            // Use low parameters for performance
            let config = Argon2idConfig::new(8192, 1, 1, output_len);
            let kdf = Argon2idKDF::with_config(config).unwrap();

            let derived = kdf.derive_key(&password, &salt).unwrap();
            prop_assert_eq!(derived.len(), output_len);
        }

        /// Derivation is deterministic
        #[test]
        fn prop_deterministic(
            password in prop::collection::vec(any::<u8>(), 0..128),
            salt in prop::collection::vec(any::<u8>(), 16..32),
        ) {
            let config = Argon2idConfig::new(8192, 1, 1, 32);
            let kdf = Argon2idKDF::with_config(config).unwrap();

            let key1 = kdf.derive_key(&password, &salt).unwrap();
            let key2 = kdf.derive_key(&password, &salt).unwrap();

            prop_assert_eq!(key1.as_bytes(), key2.as_bytes());
        }

        /// Different salts produce different keys
        #[test]
        fn prop_different_salts_different_keys(
            password in prop::collection::vec(any::<u8>(), 1..64),
            salt1 in prop::collection::vec(any::<u8>(), 16..32),
            salt2 in prop::collection::vec(any::<u8>(), 16..32),
        ) {
            prop_assume!(salt1 != salt2);

            let config = Argon2idConfig::new(8192, 1, 1, 32);
            let kdf = Argon2idKDF::with_config(config).unwrap();

            let key1 = kdf.derive_key(&password, &salt1).unwrap();
            let key2 = kdf.derive_key(&password, &salt2).unwrap();

            prop_assert_ne!(key1.as_bytes(), key2.as_bytes());
        }

        /// Salt too short is rejected
        #[test]
        fn prop_short_salt_rejected(
            password in prop::collection::vec(any::<u8>(), 0..64),
            salt_len in 0usize..16,
        ) {
            let salt = vec![0u8; salt_len];
            let kdf = Argon2idKDF::new();

            let result = kdf.derive_key(&password, &salt);
            prop_assert!(result.is_err());
        }

        /// Output is never all zeros
        #[test]
        fn prop_output_never_zero(
            password in prop::collection::vec(any::<u8>(), 0..64),
            salt in prop::collection::vec(any::<u8>(), 16..32),
        ) {
            let config = Argon2idConfig::new(8192, 1, 1, 32);
            let kdf = Argon2idKDF::with_config(config).unwrap();

            let derived = kdf.derive_key(&password, &salt).unwrap();
            let zeros = vec![0u8; derived.len()];

            prop_assert_ne!(derived.as_bytes(), zeros.as_slice());
        }
    }
}

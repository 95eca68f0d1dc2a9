//! Reference `KeyStore` backed by one file per key id on a local
//! filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{KeyStore, KeyStoreError, StoredKeyPair};
use crate::crypto::aead::{self, AeadKey, AeadNonce, DIRECTION_OUTBOUND};
use crate::crypto::kdf::{Argon2idConfig, Argon2idKDF};
use crate::crypto::sign::{Algorithm, SigningKey, VerifyingKey};

const TEMP_SUFFIX: &str = ".tmp";

/// On-disk envelope for one stored key. Only `ciphertext` is secret; the
/// rest is metadata needed to decrypt and reconstruct the pair.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    algorithm: Algorithm,
    verifying_key: Vec<u8>,
    salt: Vec<u8>,
    nonce: [u8; 12],
    ciphertext: Vec<u8>,
}

/// File-backed key store rooted at a single directory; one file per key id
/// named `<id>.key`.
pub struct FileKeyStore {
    root: PathBuf,
    kdf_config: Argon2idConfig,
}

impl FileKeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kdf_config: Argon2idConfig::default(),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.key"))
    }

    /// Atomic write: serialize to a sibling temp file, `sync_all`, then
    /// rename over the target, so a crash mid-write never corrupts an
    /// existing key.
    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> Result<(), KeyStoreError> {
        let mut temp_path = path.to_path_buf();
        let mut file_name = temp_path.file_name().unwrap_or_default().to_os_string();
        file_name.push(TEMP_SUFFIX);
        temp_path.set_file_name(file_name);

        let mut file: File = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| KeyStoreError::Io(format!("open {}: {e}", temp_path.display())))?;
        file.write_all(bytes)
            .map_err(|e| KeyStoreError::Io(format!("write {}: {e}", temp_path.display())))?;
        file.sync_all()
            .map_err(|e| KeyStoreError::Io(format!("sync {}: {e}", temp_path.display())))?;
        drop(file);

        fs::rename(&temp_path, path)
            .map_err(|e| KeyStoreError::Io(format!("rename into {}: {e}", path.display())))?;
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn store(
        &self,
        id: &str,
        keypair: &StoredKeyPair,
        passphrase: &[u8],
    ) -> Result<(), KeyStoreError> {
        let path = self.path_for(id);
        if path.exists() {
            return Err(KeyStoreError::AlreadyExists(id.to_string()));
        }

        let mut salt = vec![0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let kdf = Argon2idKDF::with_config(self.kdf_config)?;
        let derived = kdf.derive_key(passphrase, &salt)?;
        let key = AeadKey::from_bytes(derived.as_bytes())?;

        let mut nonce_bytes = [0u8; 12];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes[..8]);
        let nonce = AeadNonce::from_counter(
            u64::from_be_bytes(nonce_bytes[..8].try_into().unwrap()),
            DIRECTION_OUTBOUND,
        );

        let plaintext = keypair.signing_key.to_bytes();
        let ciphertext = aead::seal(&key, &nonce, id.as_bytes(), &plaintext)?;

        let file = KeyFile {
            algorithm: keypair.algorithm,
            verifying_key: keypair.verifying_key.to_bytes(),
            salt,
            nonce: *nonce.as_bytes(),
            ciphertext,
        };
        let bytes = serde_json::to_vec(&file)
            .map_err(|e| KeyStoreError::Encoding(format!("serialize key file: {e}")))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| KeyStoreError::Io(format!("create {}: {e}", parent.display())))?;
        }
        self.write_atomically(&path, &bytes)
    }

    fn load(&self, id: &str, passphrase: &[u8]) -> Result<StoredKeyPair, KeyStoreError> {
        let path = self.path_for(id);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => KeyStoreError::NotFound(id.to_string()),
            _ => KeyStoreError::Io(format!("read {}: {e}", path.display())),
        })?;
        let file: KeyFile = serde_json::from_slice(&bytes)
            .map_err(|e| KeyStoreError::Encoding(format!("parse key file: {e}")))?;

        let kdf = Argon2idKDF::with_config(self.kdf_config)?;
        let derived = kdf.derive_key(passphrase, &file.salt)?;
        let key = AeadKey::from_bytes(derived.as_bytes())?;
        let nonce = AeadNonce::from_counter(
            u64::from_be_bytes(file.nonce[..8].try_into().unwrap()),
            {
                let mut tag = [0u8; 4];
                tag.copy_from_slice(&file.nonce[8..]);
                tag
            },
        );

        let plaintext = aead::open(&key, &nonce, id.as_bytes(), &file.ciphertext)
            .map_err(|_| KeyStoreError::IncorrectPassphrase(id.to_string()))?;

        let signing_key = SigningKey::from_bytes(file.algorithm, &plaintext)?;
        let verifying_key = VerifyingKey::from_bytes(file.algorithm, &file.verifying_key)?;

        Ok(StoredKeyPair {
            id: id.to_string(),
            algorithm: file.algorithm,
            signing_key,
            verifying_key,
        })
    }

    fn delete(&self, id: &str) -> Result<(), KeyStoreError> {
        let path = self.path_for(id);
        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => KeyStoreError::NotFound(id.to_string()),
            _ => KeyStoreError::Io(format!("remove {}: {e}", path.display())),
        })
    }

    fn list(&self) -> Result<Vec<String>, KeyStoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)
            .map_err(|e| KeyStoreError::Io(format!("read_dir {}: {e}", self.root.display())))?
        {
            let entry = entry.map_err(|e| KeyStoreError::Io(e.to_string()))?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(id) = name.strip_suffix(".key") {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> Result<bool, KeyStoreError> {
        Ok(self.path_for(id).exists())
    }
}

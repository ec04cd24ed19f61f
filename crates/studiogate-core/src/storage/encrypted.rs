//! Passphrase-sealed file storage.
//!
//! Every write derives a fresh key from the passphrase (Argon2, random salt)
//! and seals the value with ChaCha20-Poly1305 under a random nonce. The file
//! holds a small JSON envelope with the salt, nonce and ciphertext.

use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

use super::{FileStorage, Storage, StorageError};

const ENVELOPE_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    salt: String,
    nonce: String,
    data: String,
}

pub struct EncryptedFileStorage {
    files: FileStorage,
    passphrase: String,
}

impl std::fmt::Debug for EncryptedFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStorage")
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

impl EncryptedFileStorage {
    pub fn new(files: FileStorage, passphrase: impl Into<String>) -> Self {
        Self {
            files,
            passphrase: passphrase.into(),
        }
    }

    fn cipher(&self, salt: &[u8]) -> Result<ChaCha20Poly1305, StorageError> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| StorageError::Crypto(e.to_string()))?;
        Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
    }

    fn seal(&self, plaintext: &str) -> Result<String, StorageError> {
        let salt: [u8; SALT_LEN] = rand::random();
        let nonce: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher(&salt)?
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| StorageError::Crypto(e.to_string()))?;

        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
            data: STANDARD.encode(ciphertext),
        };
        serde_json::to_string(&envelope).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn open(&self, sealed: &str) -> Result<String, StorageError> {
        let envelope: Envelope =
            serde_json::from_str(sealed).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        if envelope.v != ENVELOPE_VERSION {
            return Err(StorageError::Corrupt(format!(
                "unsupported envelope version {}",
                envelope.v
            )));
        }

        let decode = |field: &str| {
            STANDARD
                .decode(field)
                .map_err(|e| StorageError::Corrupt(e.to_string()))
        };
        let salt = decode(&envelope.salt)?;
        let nonce = decode(&envelope.nonce)?;
        let data = decode(&envelope.data)?;
        if nonce.len() != NONCE_LEN {
            return Err(StorageError::Corrupt("bad nonce length".to_string()));
        }

        let plaintext = self
            .cipher(&salt)?
            .decrypt(Nonce::from_slice(&nonce), data.as_slice())
            .map_err(|_| StorageError::Crypto("decryption failed".to_string()))?;
        String::from_utf8(plaintext).map_err(|e| StorageError::Corrupt(e.to_string()))
    }
}

impl Storage for EncryptedFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.files.get(key)? {
            Some(sealed) => self.open(&sealed).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let sealed = self.seal(value)?;
        self.files.set(key, &sealed)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.files.remove(key)
    }
}

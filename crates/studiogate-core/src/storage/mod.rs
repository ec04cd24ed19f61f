//! Storage port for persisted client state.
//!
//! The session store only ever talks to the [`Storage`] trait, so the same
//! lifecycle logic runs against:
//! - `MemoryStorage`: in-process map, used by tests and ephemeral runs
//! - `FileStorage`: one JSON file per key in the data directory
//! - `KeyringStorage`: OS-level credential storage via keyring
//! - `EncryptedFileStorage`: file storage sealed with a passphrase

pub mod credentials;
pub mod encrypted;
pub mod file;
pub mod memory;

pub use credentials::KeyringStorage;
pub use encrypted::EncryptedFileStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Minimal key-value port. Removing an absent key is not an error.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Keys become file names or keyring entries, so keep them boring.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use studiogate_core::auth::{Session, SESSION_STORAGE_KEY};
use studiogate_core::storage::MemoryStorage;
use studiogate_core::{AppContext, Config, Storage, StorageError, UserRef};

pub fn make_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.sig", header, body)
}

pub fn valid_token() -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    make_token(serde_json::json!({"sub": 1, "email": "a@b.com", "role": "admin", "exp": exp}))
}

pub fn expired_token() -> String {
    let exp = (Utc::now() - Duration::hours(1)).timestamp();
    make_token(serde_json::json!({"sub": 1, "email": "a@b.com", "role": "admin", "exp": exp}))
}

pub fn user() -> UserRef {
    UserRef {
        id: 1,
        email: "a@b.com".to_string(),
    }
}

pub fn persisted_session(token: &str) -> String {
    serde_json::to_string(&Session {
        token: token.to_string(),
        user: Some(user()),
    })
    .unwrap()
}

/// Memory storage that counts removals of the session key.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    removes: AtomicUsize,
}

impl CountingStorage {
    pub fn signed_in(token: &str) -> Self {
        Self {
            inner: MemoryStorage::with_entry(SESSION_STORAGE_KEY, &persisted_session(token)),
            removes: AtomicUsize::new(0),
        }
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn has_session(&self) -> bool {
        self.inner.contains(SESSION_STORAGE_KEY)
    }
}

impl Storage for CountingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

pub fn context(api_base: &str, storage: Arc<CountingStorage>) -> AppContext {
    let config = Config {
        api_base: api_base.to_string(),
        ..Default::default()
    };
    AppContext::new(&config, storage).unwrap()
}

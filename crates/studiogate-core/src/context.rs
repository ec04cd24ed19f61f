//! Explicit wiring of session, router and API client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::SessionStore;
use crate::config::{Config, StorageBackend};
use crate::router::{NavigationGuard, RouteTable, Router};
use crate::storage::{EncryptedFileStorage, FileStorage, KeyringStorage, MemoryStorage, Storage};

/// Everything a front end needs, built once at startup.
///
/// The session is restored (and cleared if expired) during construction, so
/// the router and client never observe an uninitialized store.
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<SessionStore>,
    pub router: Arc<Router>,
    pub api: ApiClient,
}

impl AppContext {
    pub fn new(config: &Config, storage: impl Storage + 'static) -> Result<Self> {
        Self::with_routes(config, storage, RouteTable::app_default())
    }

    pub fn with_routes(
        config: &Config,
        storage: impl Storage + 'static,
        routes: RouteTable,
    ) -> Result<Self> {
        let session = Arc::new(SessionStore::new(storage));
        session.init();

        let router = Arc::new(Router::new(routes, NavigationGuard::new(Arc::clone(&session))));
        let api = ApiClient::with_timeout(
            &config.api_base,
            Arc::clone(&session),
            Duration::from_secs(config.request_timeout_secs),
        )
        .context("Failed to build HTTP client")?
        .with_router(Arc::clone(&router));

        Ok(Self {
            session,
            router,
            api,
        })
    }

    /// Build with the storage backend named in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, storage_for(config)?)
    }
}

pub fn storage_for(config: &Config) -> Result<Box<dyn Storage>> {
    debug!(backend = ?config.storage, "Selecting storage backend");
    let storage: Box<dyn Storage> = match config.storage {
        StorageBackend::File => Box::new(FileStorage::new(config.data_dir()?)),
        StorageBackend::Keyring => Box::new(KeyringStorage::new()),
        StorageBackend::Encrypted => {
            let passphrase = config
                .passphrase
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Encrypted storage needs STUDIOGATE_PASSPHRASE"))?;
            Box::new(EncryptedFileStorage::new(
                FileStorage::new(config.data_dir()?),
                passphrase,
            ))
        }
        StorageBackend::Memory => Box::new(MemoryStorage::new()),
    };
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SESSION_STORAGE_KEY;

    #[test]
    fn test_context_initializes_session() {
        let storage = Arc::new(MemoryStorage::with_entry(SESSION_STORAGE_KEY, "{broken"));
        let ctx = AppContext::new(&Config::default(), Arc::clone(&storage)).unwrap();
        assert!(!ctx.session.is_authed());
        assert_eq!(ctx.router.current().path, "/");
    }

    #[test]
    fn test_encrypted_backend_requires_passphrase() {
        let config = Config {
            storage: StorageBackend::Encrypted,
            data_dir: Some(std::env::temp_dir()),
            ..Default::default()
        };
        assert!(storage_for(&config).is_err());
    }

    #[test]
    fn test_file_backend_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let storage = storage_for(&config).unwrap();
        storage.set(SESSION_STORAGE_KEY, "{}").unwrap();
        assert!(dir.path().join("auth.json").exists());
    }
}

//! Application configuration management.
//!
//! Configuration is stored at `~/.config/studiogate/config.json`. Any field
//! can be overridden from the environment (a `.env` file is honored by the
//! binary):
//! - `STUDIOGATE_API_BASE`
//! - `STUDIOGATE_STORAGE` (`file`, `keyring`, `encrypted`, `memory`)
//! - `STUDIOGATE_DATA_DIR`
//! - `STUDIOGATE_LOG_DIR`
//! - `STUDIOGATE_PASSPHRASE` (only for `encrypted`, never written to disk)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "studiogate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Encrypted,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "encrypted" => Ok(Self::Encrypted),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub storage: StorageBackend,
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub log_dir: Option<PathBuf>,
    #[serde(skip)]
    pub passphrase: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            storage: StorageBackend::default(),
            data_dir: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_dir: None,
            passphrase: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(api_base) = lookup("STUDIOGATE_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(storage) = lookup("STUDIOGATE_STORAGE") {
            self.storage = storage.parse()?;
        }
        if let Some(dir) = lookup("STUDIOGATE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("STUDIOGATE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(passphrase) = lookup("STUDIOGATE_PASSPHRASE") {
            self.passphrase = Some(passphrase);
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for file-backed storage.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_and_load_skip_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base: "https://api.example.com".into(),
            storage: StorageBackend::Encrypted,
            passphrase: Some("secret".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert!(!std::fs::read_to_string(&path).unwrap().contains("secret"));
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base, "https://api.example.com");
        assert_eq!(loaded.storage, StorageBackend::Encrypted);
        assert_eq!(loaded.passphrase, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage":"memory"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STUDIOGATE_API_BASE", "https://staging.example.com"),
            ("STUDIOGATE_STORAGE", "Keyring"),
            ("STUDIOGATE_DATA_DIR", "/tmp/sg"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base, "https://staging.example.com");
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/sg"));
    }

    #[test]
    fn test_bad_storage_override_is_an_error() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(|key| (key == "STUDIOGATE_STORAGE").then(|| "floppy".to_string()))
            .is_err());
    }
}

//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! which credential store and authenticator to use, the backend URL, and the
//! last email address used to sign in.
//!
//! Configuration is stored at `~/.config/legaldocs/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::api::ApiClient;
use crate::auth::{
    Authenticator, CredentialStore, DemoAuthenticator, FileCredentialStore,
    KeyringCredentialStore, MemoryCredentialStore, SessionProvider,
};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "legaldocs";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSON file in the cache directory
    #[default]
    File,
    Keyring,
    /// Nothing persists across runs
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorKind {
    #[default]
    Demo,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub credential_store: StoreKind,
    pub authenticator: AuthenticatorKind,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credential_store: StoreKind::default(),
            authenticator: AuthenticatorKind::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn credential_store(&self, cache_dir: PathBuf) -> Arc<dyn CredentialStore> {
        match self.credential_store {
            StoreKind::File => Arc::new(FileCredentialStore::new(cache_dir)),
            StoreKind::Keyring => Arc::new(KeyringCredentialStore::new()),
            StoreKind::Memory => Arc::new(MemoryCredentialStore::new()),
        }
    }

    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        Ok(match self.authenticator {
            AuthenticatorKind::Demo => Arc::new(DemoAuthenticator::new()),
            AuthenticatorKind::Remote => Arc::new(
                ApiClient::new(self.api_base_url.clone())
                    .context("Failed to build API client")?,
            ),
        })
    }

    /// Wire up a provider from this config. The caller still has to `restore`.
    pub fn session_provider(&self, cache_dir: PathBuf) -> Result<SessionProvider> {
        Ok(SessionProvider::new(
            self.credential_store(cache_dir),
            self.authenticator()?,
        ))
    }
}

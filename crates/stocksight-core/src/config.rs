//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: API base
//! URL, request timeout, where the bearer token is persisted, and the last
//! used username.
//!
//! Configuration is stored at `~/.config/stocksight/config.json`.
//! `STOCKSIGHT_API_URL` overrides the stored API base URL.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::REQUEST_TIMEOUT_SECS;
use crate::auth::{FileTokenStorage, KeyringTokenStorage, TokenStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "stocksight";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API the dashboard talks to when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "STOCKSIGHT_API_URL";

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub token_backend: TokenBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            token_backend: TokenBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the stored config (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
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

    /// Durable token backend selected by `token_backend`.
    pub fn token_storage(&self) -> Result<Box<dyn TokenStorage>> {
        Ok(match self.token_backend {
            TokenBackend::File => Box::new(FileTokenStorage::new(self.cache_dir()?)),
            TokenBackend::Keyring => Box::new(KeyringTokenStorage::new()),
        })
    }
}

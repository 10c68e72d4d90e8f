use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Token file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "stocksight";

/// Keychain entry holding the bearer token
const TOKEN_ENTRY: &str = "access_token";

/// Durable backend for the bearer token.
///
/// Implementations hold at most one token.
pub trait TokenStorage: Send + Sync {
    /// Read the persisted token, `None` if nothing is stored.
    fn load(&self) -> Result<Option<String>>;

    /// Persist `token`, replacing any previous one.
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Clearing an empty backend succeeds.
    fn clear(&self) -> Result<()>;
}

impl<T: TokenStorage + ?Sized> TokenStorage for Arc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// On-disk shape of the token file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub saved_at: DateTime<Utc>,
}

/// Token persisted as JSON in the cache directory.
pub struct FileTokenStorage {
    cache_dir: PathBuf,
}

impl FileTokenStorage {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Read the full record, including when it was written.
    pub fn load_record(&self) -> Result<Option<StoredToken>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let record: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(record))
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.load_record()?.map(|r| r.access_token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
        let record = StoredToken {
            access_token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Token persisted in the OS keychain.
pub struct KeyringTokenStorage {
    service: String,
}

impl KeyringTokenStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name, e.g. one per API host.
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_ENTRY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Volatile storage; nothing survives the process.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    /// Storage that starts out holding `token`, as if persisted by an earlier run.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load().unwrap(), None);

        storage.save("abc").unwrap();
        let record = storage.load_record().unwrap().unwrap();
        assert_eq!(record.access_token, "abc");
        assert!(record.saved_at <= Utc::now());

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
        // Clearing twice is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{").unwrap();
        let storage = FileTokenStorage::new(dir.path().to_path_buf());
        assert!(storage.load().is_err());
    }

    #[test]
    fn test_memory_storage_with_token() {
        let storage = MemoryTokenStorage::with_token("seed");
        assert_eq!(storage.load().unwrap().as_deref(), Some("seed"));
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}

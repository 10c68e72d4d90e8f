use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use super::storage::{MemoryTokenStorage, TokenStorage};

/// Holder of the current bearer token.
///
/// Reads and writes are synchronous so the store can be consulted before any
/// network activity. Every `set` replaces the in-memory token and the durable
/// copy under one write lock, so readers never observe one without the other.
pub struct CredentialStore {
    token: RwLock<Option<String>>,
    storage: Box<dyn TokenStorage>,
}

impl CredentialStore {
    /// Open the store, seeding it with whatever was last persisted.
    ///
    /// The loaded token is not validated here; an unreadable backend starts
    /// the store empty.
    pub fn open(storage: Box<dyn TokenStorage>) -> Self {
        let token = match storage.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to load persisted credential, starting without one");
                None
            }
        };
        debug!(has_token = token.is_some(), "Credential store opened");

        Self {
            token: RwLock::new(token),
            storage,
        }
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryTokenStorage::default()))
    }

    /// Get the current bearer token, if any.
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current token. `None` (or an empty token) removes it from
    /// durable storage.
    ///
    /// Persistence failures are logged; the in-memory token still changes so
    /// the next request uses the new value.
    pub fn set(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);

        let persisted = match token {
            Some(ref t) => self.storage.save(t),
            None => self.storage.clear(),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to persist credential change");
        }

        debug!(has_token = token.is_some(), "Credential updated");
        *current = token;
    }

    /// Remove the current token.
    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("has_token", &self.is_present())
            .finish()
    }
}

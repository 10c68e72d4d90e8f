//! Credential handling for the session core.
//!
//! This module provides:
//! - `CredentialStore`: process-wide holder of the bearer token
//! - `TokenStorage`: durable backends the store persists through
//!   (JSON file in the cache directory, OS keychain via keyring, or memory)
//!
//! Only the credential store reads or writes the durable backend.

pub mod credentials;
pub mod storage;

pub use credentials::CredentialStore;
pub use storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, StoredToken, TokenStorage};

//! Durable client-side storage.
//!
//! Everything the client persists (token pair, cached profile, preference
//! keys) lives in a generic async key-value store. `FileStore` is the
//! durable implementation; `MemoryStore` is the test double. The typed
//! `CredentialStore` facade owns the auth-related keys.

pub mod credentials;
pub mod file;
pub mod memory;

pub use credentials::CredentialStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no data directory available on this platform")]
    NoDataDir,
}

/// Async string key-value store.
///
/// Writes are last-write-wins; there is no cross-key transaction.
/// `remove_many` is best-effort: implementations should remove all keys in
/// one step where the backing store allows it, and callers must not assume
/// partial failure leaves any particular subset behind.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

//! JSON-file key-value store.
//!
//! Persists the whole key-value map as one pretty-printed JSON object,
//! rewritten on every mutation. That keeps multi-key removal (used by
//! credential clearing) a single file write, so the auth keys disappear
//! together rather than one at a time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{KeyValueStore, StorageError};

/// Store file name inside the application data directory.
const STORE_FILE: &str = "store.json";

/// Application name used for the data directory path.
const APP_NAME: &str = "deepoct";

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process. Individual
    // keys remain last-write-wins.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the platform data directory, e.g.
    /// `~/.local/share/deepoct/store.json` on Linux.
    pub fn default_location() -> Result<Self, StorageError> {
        let data_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(Self::new(data_dir.join(APP_NAME).join(STORE_FILE)))
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let mut changed = false;
        for key in keys {
            changed |= map.remove(*key).is_some();
        }
        if changed {
            self.write_map(&map).await?;
            debug!(count = keys.len(), "removed keys from store file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_store() -> FileStore {
        let unique = format!(
            "deepoct-filestore-test-{}-{}.json",
            std::process::id(),
            TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        FileStore::new(std::env::temp_dir().join(unique))
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = temp_store();
        assert!(store.get("access_token").await.unwrap().is_none());

        store.set("access_token", "A1").await.unwrap();
        assert_eq!(store.get("access_token").await.unwrap().as_deref(), Some("A1"));

        store.set("access_token", "A2").await.unwrap();
        assert_eq!(store.get("access_token").await.unwrap().as_deref(), Some("A2"));

        tokio::fs::remove_file(&store.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_many_clears_all_keys_together() {
        let store = temp_store();
        store.set("access_token", "A1").await.unwrap();
        store.set("refresh_token", "R1").await.unwrap();
        store.set("user_data", "{}").await.unwrap();
        store.set("language", "vi").await.unwrap();

        store
            .remove_many(&["access_token", "refresh_token", "user_data"])
            .await
            .unwrap();

        assert!(store.get("access_token").await.unwrap().is_none());
        assert!(store.get("refresh_token").await.unwrap().is_none());
        assert!(store.get("user_data").await.unwrap().is_none());
        // Unrelated keys survive a credential clear
        assert_eq!(store.get("language").await.unwrap().as_deref(), Some("vi"));

        tokio::fs::remove_file(&store.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let store = temp_store();
        assert!(store.get("anything").await.unwrap().is_none());
        store.remove("anything").await.unwrap();
        store.remove_many(&["a", "b"]).await.unwrap();
    }
}

//! Persistent key-value storage for the serialized session record.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::StoreError;

/// Keychain service name for the keyring-backed store
const SERVICE_NAME: &str = "legaldocs";

/// Somewhere a single serialized session survives process restarts.
///
/// `delete` of a missing key succeeds; callers rely on that for idempotent
/// logout.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns only once the value is durable.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store. Nothing survives a restart unless the same instance
/// is handed to the next provider.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// One `<key>.json` file per key inside a directory (normally the cache dir).
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so a crash never leaves a half-written record
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;
        sync_dir(&self.dir).await?;

        debug!(path = %path.display(), "Session record written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persist the rename itself. Directories cannot be opened for syncing on
/// Windows, where the rename is already durable once it returns.
#[cfg(unix)]
async fn sync_dir(dir: &std::path::Path) -> Result<(), StoreError> {
    tokio::fs::File::open(dir).await?.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &std::path::Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// OS keychain
// ============================================================================

/// Keychain calls block, so each one runs on the blocking pool. Entries are
/// kept per key: some backends only hold a credential on the `Entry` that
/// wrote it.
pub struct KeyringCredentialStore {
    service: String,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    async fn entry(&self, key: &str) -> Result<Arc<Entry>, StoreError> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(key) {
            return Ok(entry.clone());
        }
        let entry = Arc::new(Entry::new(&self.service, key)?);
        entries.insert(key.to_string(), entry.clone());
        Ok(entry)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = self.entry(key).await?;
        match tokio::task::spawn_blocking(move || entry.get_password()).await? {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = self.entry(key).await?;
        let value = value.to_string();
        tokio::task::spawn_blocking(move || entry.set_password(&value)).await??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let entry = self.entry(key).await?;
        match tokio::task::spawn_blocking(move || entry.delete_credential()).await? {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_delete() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get("user").await.unwrap(), None);

        store.set("user", "one").await.unwrap();
        store.set("user", "two").await.unwrap();
        assert_eq!(store.get("user").await.unwrap().as_deref(), Some("two"));

        store.delete("user").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);
        // Deleting again is fine
        store.delete("user").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join("legaldocs");

        let store = FileCredentialStore::new(nested.clone());
        store.set("user", r#"{"id":"1"}"#).await.unwrap();

        let reopened = FileCredentialStore::new(nested.clone());
        assert_eq!(
            reopened.get("user").await.unwrap().as_deref(),
            Some(r#"{"id":"1"}"#)
        );
        assert!(nested.join("user.json").exists());
        assert!(!nested.join(".user.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_missing_and_delete_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());

        assert_eq!(store.get("user").await.unwrap(), None);
        store.delete("user").await.unwrap();

        store.set("user", "x").await.unwrap();
        store.delete("user").await.unwrap();
        store.delete("user").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());

        store.set("user", r#"{"id":"long-first-record"}"#).await.unwrap();
        store.set("user", r#"{"id":"2"}"#).await.unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("user.json")).unwrap();
        assert_eq!(on_disk, r#"{"id":"2"}"#);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_keyring_store_keeps_what_it_sets() {
        // In-process keychain so the test never touches the real one
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let store = KeyringCredentialStore::with_service("legaldocs-test");

        assert_eq!(store.get("user").await.unwrap(), None);
        store.set("user", "{}").await.unwrap();
        assert_eq!(store.get("user").await.unwrap().as_deref(), Some("{}"));

        store.set("user", r#"{"id":"2"}"#).await.unwrap();
        assert_eq!(
            store.get("user").await.unwrap().as_deref(),
            Some(r#"{"id":"2"}"#)
        );

        store.delete("user").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);
        store.delete("user").await.unwrap();
    }
}

//! In-memory raw store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::error::StorageError;
use crate::domain::storage::{DbKey, RawStore};

/// Thread-safe in-memory byte store
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryRawStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRawStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RawStore for InMemoryRawStore {
    async fn put_raw(&self, key: &DbKey, value: &[u8]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::io(format!("Failed to acquire write lock: {}", e)))?;

        entries.insert(key.to_raw(), value.to_vec());
        Ok(())
    }

    async fn get_raw(&self, key: &DbKey) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::io(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entries.get(&key.to_raw()).cloned())
    }

    async fn delete(&self, key: &DbKey) -> Result<bool, StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::io(format!("Failed to acquire write lock: {}", e)))?;

        Ok(entries.remove(&key.to_raw()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::TeamId;

    fn key(suffix: &str) -> DbKey {
        DbKey::team_chain_state(&TeamId::new(format!("0123456789abcdef0123456789ab{}24", suffix)).unwrap())
    }

    #[tokio::test]
    async fn test_put_get() {
        let store = InMemoryRawStore::new();
        store.put_raw(&key("00"), b"one").await.unwrap();

        assert_eq!(store.get_raw(&key("00")).await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get_raw(&key("01")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryRawStore::new();
        store.put_raw(&key("00"), b"one").await.unwrap();
        store.put_raw(&key("00"), b"two").await.unwrap();

        assert_eq!(store.get_raw(&key("00")).await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryRawStore::new();
        store.put_raw(&key("00"), b"one").await.unwrap();

        assert!(store.delete(&key("00")).await.unwrap());
        assert!(!store.delete(&key("00")).await.unwrap());
        assert!(store.is_empty());
    }
}

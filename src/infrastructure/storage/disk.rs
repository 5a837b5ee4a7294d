//! Disk tier: versioned, encrypted team data in the local raw store

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::StorageError;
use crate::domain::storage::{DbKey, DeviceKeyProvider, RawStore};
use crate::domain::team::{TeamData, TeamId};
use crate::infrastructure::crypto::SecretBox;

/// Bump to invalidate every record written by an older build
pub const DISK_STORAGE_VERSION: u32 = 1;

const STORAGE_KEY_CONTEXT: &str = "teamchain-teams-local-storage-1";

#[derive(Debug, Serialize, Deserialize)]
struct DiskStorageItem {
    version: u32,
    state: TeamData,
}

#[derive(Deserialize)]
struct DiskStorageHeader {
    version: u32,
}

#[derive(Debug, Clone)]
pub struct DiskStorage {
    store: Arc<dyn RawStore>,
    device_keys: Arc<dyn DeviceKeyProvider>,
}

impl DiskStorage {
    pub fn new(store: Arc<dyn RawStore>, device_keys: Arc<dyn DeviceKeyProvider>) -> Self {
        Self { store, device_keys }
    }

    async fn secret_box(&self) -> Result<SecretBox, StorageError> {
        let key = self
            .device_keys
            .derive_symmetric_key(STORAGE_KEY_CONTEXT)
            .await?;
        Ok(SecretBox::new(&key))
    }

    pub async fn put(&self, data: &TeamData) -> Result<(), StorageError> {
        let item = DiskStorageItem {
            version: DISK_STORAGE_VERSION,
            state: data.clone(),
        };
        let plaintext = serde_json::to_vec(&item).map_err(|e| StorageError::encode(e.to_string()))?;
        let sealed = self
            .secret_box()
            .await?
            .seal_combined(&plaintext)
            .map_err(|e| StorageError::crypto(e.to_string()))?;

        self.store
            .put_raw(&DbKey::team_chain_state(data.id()), &sealed)
            .await
    }

    /// `Ok(None)` for absent, unreadable, outdated or mismatched records.
    /// Errors mean the store or the device key could not be reached.
    pub async fn get(&self, team_id: &TeamId) -> Result<Option<TeamData>, StorageError> {
        let key = DbKey::team_chain_state(team_id);

        let Some(sealed) = self.store.get_raw(&key).await? else {
            return Ok(None);
        };

        let plaintext = match self.secret_box().await?.open_combined(&sealed) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Cannot decrypt disk cache entry");
                return Ok(None);
            }
        };

        let header: DiskStorageHeader = match serde_json::from_slice(&plaintext) {
            Ok(header) => header,
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Unreadable disk cache entry");
                return Ok(None);
            }
        };

        if header.version != DISK_STORAGE_VERSION {
            debug!(
                team_id = %team_id,
                version = header.version,
                current = DISK_STORAGE_VERSION,
                "Disk cache entry has an old format, ignoring"
            );
            return Ok(None);
        }

        let item: DiskStorageItem = match serde_json::from_slice(&plaintext) {
            Ok(item) => item,
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Undecodable disk cache entry");
                return Ok(None);
            }
        };

        if item.state.id() != team_id {
            warn!(
                team_id = %team_id,
                found = %item.state.id(),
                "Disk cache entry reports a different team, ignoring"
            );
            return Ok(None);
        }

        Ok(Some(item.state))
    }

    pub async fn delete(&self, team_id: &TeamId) -> Result<bool, StorageError> {
        self.store.delete(&DbKey::team_chain_state(team_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::{MockDeviceKeyProvider, MockRawStore};
    use crate::testutil::team_data;
    use tokio_test::{assert_err, assert_ok};

    fn disk(store: Arc<MockRawStore>, device: u8) -> DiskStorage {
        DiskStorage::new(store, Arc::new(MockDeviceKeyProvider::new(device)))
    }

    async fn write_item(store: &MockRawStore, team_id: &TeamId, version: u32, state: &TeamData) {
        let key = MockDeviceKeyProvider::new(1)
            .derive_symmetric_key(STORAGE_KEY_CONTEXT)
            .await
            .unwrap();
        let item = DiskStorageItem {
            version,
            state: state.clone(),
        };
        let sealed = SecretBox::new(&key)
            .seal_combined(&serde_json::to_vec(&item).unwrap())
            .unwrap();
        store.set_raw_entry(&DbKey::team_chain_state(team_id), sealed);
    }

    #[tokio::test]
    async fn test_put_get() {
        let store = Arc::new(MockRawStore::new());
        let disk = disk(store.clone(), 1);
        let data = team_data("acme");

        assert_ok!(disk.put(&data).await);
        assert_eq!(assert_ok!(disk.get(data.id()).await), Some(data.clone()));

        let raw = store.raw_entry(&DbKey::team_chain_state(data.id())).unwrap();
        let needle = data.id().as_str().as_bytes();
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[tokio::test]
    async fn test_old_version_is_a_miss() {
        let store = Arc::new(MockRawStore::new());
        let data = team_data("acme");
        write_item(&store, data.id(), DISK_STORAGE_VERSION - 1, &data).await;

        assert_eq!(disk(store, 1).get(data.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_old_layout_is_never_decoded() {
        let store = Arc::new(MockRawStore::new());
        let data = team_data("acme");
        let key = MockDeviceKeyProvider::new(1)
            .derive_symmetric_key(STORAGE_KEY_CONTEXT)
            .await
            .unwrap();
        let legacy = serde_json::json!({ "version": 0, "state": { "unrelated": true } });
        let sealed = SecretBox::new(&key)
            .seal_combined(&serde_json::to_vec(&legacy).unwrap())
            .unwrap();
        store.set_raw_entry(&DbKey::team_chain_state(data.id()), sealed);

        assert_eq!(disk(store, 1).get(data.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_for_other_team_is_a_miss() {
        let store = Arc::new(MockRawStore::new());
        let acme = team_data("acme");
        let other = team_data("other");
        write_item(&store, other.id(), DISK_STORAGE_VERSION, &acme).await;

        assert_eq!(disk(store, 1).get(other.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = Arc::new(MockRawStore::new());
        let data = team_data("acme");
        store.set_raw_entry(&DbKey::team_chain_state(data.id()), vec![0u8; 64]);

        assert_eq!(disk(store, 1).get(data.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_other_device_cannot_read() {
        let store = Arc::new(MockRawStore::new());
        let data = team_data("acme");
        disk(store.clone(), 1).put(&data).await.unwrap();

        assert_eq!(disk(store, 2).get(data.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let store = Arc::new(MockRawStore::new().with_error("disk gone"));
        let data = team_data("acme");

        assert_err!(disk(store.clone(), 1).put(&data).await);
        assert_err!(disk(store, 1).get(data.id()).await);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(MockRawStore::new());
        let disk = disk(store, 1);
        let data = team_data("acme");
        disk.put(&data).await.unwrap();

        assert!(disk.delete(data.id()).await.unwrap());
        assert_eq!(disk.get(data.id()).await.unwrap(), None);
    }
}

//! Raw key-value store and device key seams

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::DbKey;
use crate::domain::error::StorageError;

/// Local byte store shared with other subsystems. Values are opaque here; the
/// caller encrypts before writing.
#[async_trait]
pub trait RawStore: Send + Sync + Debug {
    async fn put_raw(&self, key: &DbKey, value: &[u8]) -> Result<(), StorageError>;

    /// `Ok(None)` when the key is absent
    async fn get_raw(&self, key: &DbKey) -> Result<Option<Vec<u8>>, StorageError>;

    async fn delete(&self, key: &DbKey) -> Result<bool, StorageError>;
}

/// Access to the device's secret encryption key
#[async_trait]
pub trait DeviceKeyProvider: Send + Sync + Debug {
    /// Derive a 32-byte symmetric key bound to `context`. Distinct contexts
    /// must yield unrelated keys.
    async fn derive_symmetric_key(&self, context: &str) -> Result<[u8; 32], StorageError>;
}

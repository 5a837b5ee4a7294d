//! Filesystem raw store: one file per key

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::error::StorageError;
use crate::domain::storage::{DbKey, RawStore};

/// Stores each value in `<dir>/<hex of raw key>`. Writes go to a temp file
/// that is renamed into place, so readers see the old or the new value.
#[derive(Debug, Clone)]
pub struct FsRawStore {
    dir: PathBuf,
}

impl FsRawStore {
    /// Open `dir`, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(format!("create {}: {}", dir.display(), e)))?;

        debug!(dir = %dir.display(), "Opened filesystem store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &DbKey) -> PathBuf {
        self.dir.join(hex::encode(key.to_raw()))
    }
}

#[async_trait]
impl RawStore for FsRawStore {
    async fn put_raw(&self, key: &DbKey, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("tmp-{:016x}", rand::random::<u64>()));

        fs::write(&tmp, value)
            .await
            .map_err(|e| StorageError::io(format!("write {}: {}", tmp.display(), e)))?;

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::io(format!("rename {}: {}", path.display(), e)));
        }

        Ok(())
    }

    async fn get_raw(&self, key: &DbKey) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(format!("read {}: {}", path.display(), e))),
        }
    }

    async fn delete(&self, key: &DbKey) -> Result<bool, StorageError> {
        let path = self.path_for(key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(format!("delete {}: {}", path.display(), e))),
        }
    }
}

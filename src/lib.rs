//! teamchain
//!
//! Client-side loading of team sigchains:
//! - Signed chain link codec and the state-machine player that folds links
//! - Per-team key boxes, opened with the caller's per-user keys
//! - Member set resolution for membership changes
//! - A memory LRU over an encrypted on-disk cache of verified teams
//! - The team loader that ties the above together

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod testutil;

pub use crate::config::AppConfig;

use std::sync::Arc;

use tracing::info;

use crate::config::CacheConfig;
use crate::domain::identity::IdentityDirectory;
use crate::domain::keys::PerUserKeyring;
use crate::domain::server::TeamServer;
use crate::domain::storage::{DeviceKeyProvider, RawStore};
use crate::infrastructure::identity::CachedIdentityDirectory;
use crate::infrastructure::kv::{FsRawStore, InMemoryRawStore};
use crate::infrastructure::loader::TeamLoader;
use crate::infrastructure::storage::Storage;

/// Create the two-tier team cache described by the cache configuration
pub async fn create_storage_with_config(
    config: &CacheConfig,
    device_keys: Arc<dyn DeviceKeyProvider>,
) -> anyhow::Result<Arc<Storage>> {
    let store: Arc<dyn RawStore> = match &config.data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using on-disk team cache");
            Arc::new(
                FsRawStore::open(dir)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to open team cache: {}", e))?,
            )
        }
        None => {
            info!("Using in-memory team cache");
            Arc::new(InMemoryRawStore::new())
        }
    };

    Ok(Arc::new(Storage::new(
        store,
        device_keys,
        config.memory_capacity,
    )))
}

/// Create a team loader with all of its collaborators wired from configuration.
/// Signer lookups go through a TTL cache in front of `directory`.
pub async fn create_team_loader<D: IdentityDirectory + 'static>(
    config: &AppConfig,
    server: Arc<dyn TeamServer>,
    directory: D,
    keyring: Arc<dyn PerUserKeyring>,
    device_keys: Arc<dyn DeviceKeyProvider>,
) -> anyhow::Result<TeamLoader> {
    let storage = create_storage_with_config(&config.cache, device_keys).await?;
    let directory = Arc::new(CachedIdentityDirectory::from_config(
        directory,
        &config.identity,
    ));

    Ok(TeamLoader::new(
        storage,
        server,
        directory,
        keyring,
        &config.loader,
    ))
}

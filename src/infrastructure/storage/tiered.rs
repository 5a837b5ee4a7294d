//! Two-tier team cache: memory LRU in front of the encrypted disk tier

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::disk::DiskStorage;
use super::memory::MemoryStorage;
use crate::domain::storage::{DeviceKeyProvider, RawStore};
use crate::domain::team::{TeamData, TeamId};

/// Verified team data cache. Every operation runs inside one critical section,
/// so a `get` never observes half of a `put`.
#[derive(Debug)]
pub struct Storage {
    memory: Mutex<MemoryStorage>,
    disk: DiskStorage,
}

impl Storage {
    pub fn new(
        store: Arc<dyn RawStore>,
        device_keys: Arc<dyn DeviceKeyProvider>,
        memory_capacity: usize,
    ) -> Self {
        Self {
            memory: Mutex::new(MemoryStorage::new(memory_capacity)),
            disk: DiskStorage::new(store, device_keys),
        }
    }

    /// Store in memory, then on disk. A disk failure only costs durability.
    pub async fn put(&self, data: TeamData) {
        let mut memory = self.memory.lock().await;

        if let Err(e) = self.disk.put(&data).await {
            warn!(team_id = %data.id(), error = %e, "Failed to write team to disk cache");
        }

        memory.put(data);
    }

    /// Memory first, then disk; a disk hit is copied back into memory
    pub async fn get(&self, team_id: &TeamId) -> Option<TeamData> {
        let mut memory = self.memory.lock().await;

        if let Some(data) = memory.get(team_id) {
            debug!(team_id = %team_id, "Team cache hit in memory");
            return Some(data);
        }

        match self.disk.get(team_id).await {
            Ok(Some(data)) => {
                debug!(team_id = %team_id, "Team cache hit on disk");
                memory.put(data.clone());
                Some(data)
            }
            Ok(None) => {
                debug!(team_id = %team_id, "Team cache miss");
                None
            }
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Failed to read team from disk cache");
                None
            }
        }
    }

    /// Drop a team from both tiers
    pub async fn delete(&self, team_id: &TeamId) {
        let mut memory = self.memory.lock().await;
        memory.remove(team_id);

        if let Err(e) = self.disk.delete(team_id).await {
            warn!(team_id = %team_id, error = %e, "Failed to delete team from disk cache");
        }
    }

    /// Whether the memory tier holds `team_id`, without touching recency
    pub async fn in_memory(&self, team_id: &TeamId) -> bool {
        self.memory.lock().await.contains(team_id)
    }
}

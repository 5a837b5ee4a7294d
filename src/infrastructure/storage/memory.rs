//! Memory tier: bounded LRU of verified team data

use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::warn;

use crate::domain::team::{TeamData, TeamId};

pub const DEFAULT_MEMORY_CAPACITY: usize = 50;

/// Least-recently-used map from team id to team data. Not synchronized; the
/// owning `Storage` guards it.
#[derive(Debug)]
pub struct MemoryStorage {
    lru: LruCache<TeamId, TeamData>,
}

impl MemoryStorage {
    /// A capacity of 0 falls back to the default
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            lru: LruCache::new(capacity),
        }
    }

    /// Look up and mark as most recently used
    pub fn get(&mut self, team_id: &TeamId) -> Option<TeamData> {
        let data = self.lru.get(team_id)?;

        if data.id() != team_id {
            warn!(
                team_id = %team_id,
                found = %data.id(),
                "Memory cache entry reports a different team, dropping it"
            );
            self.lru.pop(team_id);
            return None;
        }

        Some(data.clone())
    }

    pub fn put(&mut self, data: TeamData) {
        self.lru.put(data.id().clone(), data);
    }

    pub fn remove(&mut self, team_id: &TeamId) -> Option<TeamData> {
        self.lru.pop(team_id)
    }

    /// Presence check that does not touch recency
    pub fn contains(&self, team_id: &TeamId) -> bool {
        self.lru.contains(team_id)
    }

    pub fn len(&self) -> usize {
        self.lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lru.cap().get()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::config::IdentityConfig;
use crate::domain::error::ResolutionError;
use crate::domain::identity::{IdentityDirectory, Uid, UserKeyHistory};

/// Identity directory wrapper that caches resolutions and key histories with a TTL
#[derive(Debug)]
pub struct CachedIdentityDirectory<D: IdentityDirectory> {
    inner: D,
    uids: Cache<String, Uid>,
    histories: Cache<Uid, Arc<UserKeyHistory>>,
}

impl<D: IdentityDirectory> CachedIdentityDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 1000)
    }

    pub fn from_config(inner: D, config: &IdentityConfig) -> Self {
        Self::with_capacity(
            inner,
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity,
        )
    }

    pub fn with_capacity(inner: D, ttl: Duration, capacity: u64) -> Self {
        let uids = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();
        let histories = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self {
            inner,
            uids,
            histories,
        }
    }

    /// Forget a user's key history, e.g. after they rotate a per-user key
    pub async fn invalidate(&self, uid: &Uid) {
        self.histories.invalidate(uid).await;
    }

    pub fn invalidate_all(&self) {
        self.uids.invalidate_all();
        self.histories.invalidate_all();
    }
}

#[async_trait]
impl<D: IdentityDirectory> IdentityDirectory for CachedIdentityDirectory<D> {
    async fn resolve(&self, username: &str) -> Result<Uid, ResolutionError> {
        let key = username.to_lowercase();

        if let Some(uid) = self.uids.get(&key).await {
            tracing::trace!(username = %key, "Cache hit for username");
            return Ok(uid);
        }

        tracing::debug!(username = %key, "Cache miss, resolving username");
        let uid = self.inner.resolve(&key).await?;
        self.uids.insert(key, uid.clone()).await;

        Ok(uid)
    }

    async fn load_key_history(&self, uid: &Uid) -> Result<UserKeyHistory, ResolutionError> {
        if let Some(cached) = self.histories.get(uid).await {
            tracing::trace!(uid = %uid, "Cache hit for key history");
            return Ok((*cached).clone());
        }

        tracing::debug!(uid = %uid, "Cache miss, loading key history");
        let history = self.inner.load_key_history(uid).await?;
        self.histories
            .insert(uid.clone(), Arc::new(history.clone()))
            .await;

        Ok(history)
    }
}

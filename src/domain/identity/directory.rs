//! Identity directory seam: username resolution and per-user key history

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::ResolutionError;
use crate::domain::keys::{current_per_user_key, PerUserKey};
use crate::domain::team::UserVersion;

/// Stable user identifier returned by resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's current identity epoch and every per-user key it has published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKeyHistory {
    pub uid: Uid,
    pub username: String,
    pub eldest_seqno: u64,
    pub per_user_keys: Vec<PerUserKey>,
}

impl UserKeyHistory {
    pub fn user_version(&self) -> Result<UserVersion, ResolutionError> {
        UserVersion::new(&self.username, self.eldest_seqno)
            .map_err(|_| ResolutionError::UnresolvedMember(self.username.clone()))
    }

    pub fn current_per_user_key(&self) -> Option<&PerUserKey> {
        current_per_user_key(&self.per_user_keys)
    }
}

/// Resolves usernames and loads their key histories
#[async_trait]
pub trait IdentityDirectory: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, username: &str) -> Result<Uid, ResolutionError>;

    async fn load_key_history(&self, uid: &Uid) -> Result<UserKeyHistory, ResolutionError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    /// In-memory directory keyed by username
    #[derive(Debug, Default)]
    pub struct MockIdentityDirectory {
        users: RwLock<HashMap<String, UserKeyHistory>>,
        lookups: AtomicUsize,
    }

    impl MockIdentityDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_user(self, history: UserKeyHistory) -> Self {
            self.users
                .write()
                .unwrap()
                .insert(history.username.clone(), history);
            self
        }

        pub fn lookup_count(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityDirectory for MockIdentityDirectory {
        async fn resolve(&self, username: &str) -> Result<Uid, ResolutionError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.users
                .read()
                .unwrap()
                .get(username)
                .map(|h| h.uid.clone())
                .ok_or_else(|| ResolutionError::UnresolvedMember(username.to_string()))
        }

        async fn load_key_history(&self, uid: &Uid) -> Result<UserKeyHistory, ResolutionError> {
            self.users
                .read()
                .unwrap()
                .values()
                .find(|h| &h.uid == uid)
                .cloned()
                .ok_or_else(|| ResolutionError::UnresolvedMember(uid.to_string()))
        }
    }
}

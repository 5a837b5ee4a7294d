//! Identity directory backed by a saved JSON export of user key histories

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::ResolutionError;
use crate::domain::identity::{IdentityDirectory, Uid, UserKeyHistory};

/// Holds every user from a JSON array of `UserKeyHistory` records
#[derive(Debug, Default)]
pub struct FileIdentityDirectory {
    by_username: HashMap<String, Uid>,
    histories: HashMap<Uid, UserKeyHistory>,
}

impl FileIdentityDirectory {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let users: Vec<UserKeyHistory> =
            serde_json::from_str(&contents).context("parsing user key histories")?;

        debug!(path = %path.display(), users = users.len(), "Loaded identity directory");
        Ok(Self::from_histories(users))
    }

    pub fn from_histories(users: impl IntoIterator<Item = UserKeyHistory>) -> Self {
        let mut directory = Self::default();
        for history in users {
            directory
                .by_username
                .insert(history.username.to_lowercase(), history.uid.clone());
            directory.histories.insert(history.uid.clone(), history);
        }
        directory
    }
}

#[async_trait]
impl IdentityDirectory for FileIdentityDirectory {
    async fn resolve(&self, username: &str) -> Result<Uid, ResolutionError> {
        self.by_username
            .get(&username.to_lowercase())
            .cloned()
            .ok_or_else(|| ResolutionError::UnresolvedMember(username.to_string()))
    }

    async fn load_key_history(&self, uid: &Uid) -> Result<UserKeyHistory, ResolutionError> {
        self.histories
            .get(uid)
            .cloned()
            .ok_or_else(|| ResolutionError::UnresolvedMember(uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestUser;

    #[tokio::test]
    async fn test_open_and_resolve() {
        let alice = TestUser::new("alice", 1).key_history();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, serde_json::to_vec(&[alice.clone()]).unwrap()).unwrap();

        let directory = FileIdentityDirectory::open(&path).await.unwrap();
        let uid = directory.resolve("Alice").await.unwrap();

        assert_eq!(uid, alice.uid);
        assert_eq!(directory.load_key_history(&uid).await.unwrap(), alice);
        assert_eq!(
            directory.resolve("mallory").await,
            Err(ResolutionError::UnresolvedMember("mallory".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        assert!(FileIdentityDirectory::open("/nonexistent/users.json").await.is_err());
    }
}

//! Key-box audience keyed by username

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::keys::PerUserKey;

/// Usernames that should receive the next team key, with the per-user key to
/// seal it to. A username marked removed can never be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    keys: BTreeMap<String, PerUserKey>,
    removed: BTreeSet<String>,
}

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a username removed, dropping it if present
    pub fn exclude(&mut self, username: &str) {
        let username = username.to_lowercase();
        self.keys.remove(&username);
        self.removed.insert(username);
    }

    /// Add a recipient. Returns false for removed usernames.
    pub fn insert(&mut self, username: &str, key: PerUserKey) -> bool {
        let username = username.to_lowercase();
        if self.removed.contains(&username) {
            return false;
        }

        self.keys.insert(username, key);
        true
    }

    pub fn remove(&mut self, username: &str) -> Option<PerUserKey> {
        self.keys.remove(&username.to_lowercase())
    }

    /// Union with `other`; removals on either side win
    pub fn merge(&mut self, other: Recipients) {
        for username in &other.removed {
            self.exclude(username);
        }

        for (username, key) in other.keys {
            self.insert(&username, key);
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.keys.contains_key(&username.to_lowercase())
    }

    pub fn is_excluded(&self, username: &str) -> bool {
        self.removed.contains(&username.to_lowercase())
    }

    pub fn get(&self, username: &str) -> Option<&PerUserKey> {
        self.keys.get(&username.to_lowercase())
    }

    pub fn usernames(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PerUserKey)> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

//! Per-user keys and the caller's own per-user secret keyring

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use super::kid::Kid;
use crate::domain::error::KeyError;

/// Public half of one generation of a user's per-user key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerUserKey {
    pub seqno: u64,
    pub signing_kid: Kid,
    pub encryption_kid: Kid,
}

/// The newest key in a user's per-user key history
pub fn current_per_user_key(keys: &[PerUserKey]) -> Option<&PerUserKey> {
    keys.iter().max_by_key(|k| k.seqno)
}

/// The caller's per-user encryption secrets, indexed by per-user key seqno
#[derive(Clone, Default)]
pub struct PerUserSecretKeys {
    keys: BTreeMap<u64, StaticSecret>,
}

impl PerUserSecretKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, seqno: u64, secret: StaticSecret) {
        self.keys.insert(seqno, secret);
    }

    pub fn with_key(mut self, seqno: u64, secret: StaticSecret) -> Self {
        self.insert(seqno, secret);
        self
    }

    /// Encryption secret at exactly this seqno
    pub fn encryption_key(&self, seqno: u64) -> Option<&StaticSecret> {
        self.keys.get(&seqno)
    }

    pub fn current_seqno(&self) -> Option<u64> {
        self.keys.keys().next_back().copied()
    }

    /// Kid of the public half of the key at `seqno`
    pub fn encryption_kid(&self, seqno: u64) -> Option<Kid> {
        self.keys
            .get(&seqno)
            .map(|secret| Kid::from_encryption_key(&PublicKey::from(secret)))
    }
}

impl std::fmt::Debug for PerUserSecretKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerUserSecretKeys")
            .field("seqnos", &self.keys.keys().collect::<Vec<_>>())
            .field("secrets", &"<REDACTED>")
            .finish()
    }
}

/// Source of the local user's per-user secret keys
#[async_trait]
pub trait PerUserKeyring: Send + Sync + std::fmt::Debug {
    /// Refresh the keyring from the key directory before use
    async fn sync(&self) -> Result<(), KeyError> {
        Ok(())
    }

    /// Snapshot of every per-user encryption secret this device holds
    async fn secret_keys(&self) -> Result<PerUserSecretKeys, KeyError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Keyring holding a fixed set of secrets
    #[derive(Debug, Default)]
    pub struct MockPerUserKeyring {
        keys: PerUserSecretKeys,
        syncs: AtomicUsize,
    }

    impl MockPerUserKeyring {
        pub fn new(keys: PerUserSecretKeys) -> Self {
            Self {
                keys,
                syncs: AtomicUsize::new(0),
            }
        }

        pub fn sync_count(&self) -> usize {
            self.syncs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PerUserKeyring for MockPerUserKeyring {
        async fn sync(&self) -> Result<(), KeyError> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn secret_keys(&self) -> Result<PerUserSecretKeys, KeyError> {
            Ok(self.keys.clone())
        }
    }
}

//! Per-user keyring holding a fixed set of secrets

use async_trait::async_trait;
use x25519_dalek::StaticSecret;

use crate::domain::error::KeyError;
use crate::domain::keys::{PerUserKeyring, PerUserSecretKeys};

/// Keyring for tools that are handed the user's per-user secrets directly
#[derive(Debug, Clone)]
pub struct StaticKeyring {
    keys: PerUserSecretKeys,
}

impl StaticKeyring {
    pub fn new(keys: PerUserSecretKeys) -> Self {
        Self { keys }
    }

    /// Parse `seqno:hex` pairs, one per per-user key generation
    pub fn from_hex_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, KeyError> {
        let mut keys = PerUserSecretKeys::new();

        for pair in pairs {
            let (seqno, secret) = pair
                .split_once(':')
                .ok_or_else(|| KeyError::keyring(format!("expected seqno:hex, got '{}'", pair)))?;

            let seqno: u64 = seqno
                .parse()
                .map_err(|e| KeyError::keyring(format!("bad seqno '{}': {}", seqno, e)))?;

            let bytes: [u8; 32] = hex::decode(secret)
                .map_err(|e| KeyError::keyring(format!("bad key hex: {}", e)))?
                .try_into()
                .map_err(|_| KeyError::keyring("per-user key must be 32 bytes"))?;

            keys.insert(seqno, StaticSecret::from(bytes));
        }

        Ok(Self { keys })
    }
}

#[async_trait]
impl PerUserKeyring for StaticKeyring {
    async fn secret_keys(&self) -> Result<PerUserSecretKeys, KeyError> {
        Ok(self.keys.clone())
    }
}

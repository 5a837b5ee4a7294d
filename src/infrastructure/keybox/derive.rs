//! Per-team keypairs derived from a generation's seed

use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::domain::error::KeyError;
use crate::domain::keys::Kid;
use crate::domain::team::PerTeamKeySeed;

type HmacSha256 = Hmac<Sha256>;

const SIGNING_KEY_CONTEXT: &[u8] = b"teamchain-derived-team-eddsa-1";
const ENCRYPTION_KEY_CONTEXT: &[u8] = b"teamchain-derived-team-dh-1";

/// Signing and encryption keys of one per-team key generation
pub struct TeamKeyManager {
    generation: u32,
    signing_key: SigningKey,
    encryption_key: StaticSecret,
}

impl TeamKeyManager {
    pub fn new(seed: &PerTeamKeySeed, generation: u32) -> Result<Self, KeyError> {
        let signing_seed = derive(seed, SIGNING_KEY_CONTEXT, generation)?;
        let encryption_seed = derive(seed, ENCRYPTION_KEY_CONTEXT, generation)?;

        Ok(Self {
            generation,
            signing_key: SigningKey::from_bytes(&signing_seed),
            encryption_key: StaticSecret::from(*encryption_seed),
        })
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn signing_kid(&self) -> Kid {
        Kid::from_signing_key(&self.signing_key.verifying_key())
    }

    pub fn encryption_kid(&self) -> Kid {
        Kid::from_encryption_key(&PublicKey::from(&self.encryption_key))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for TeamKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamKeyManager")
            .field("generation", &self.generation)
            .field("signing_kid", &self.signing_kid())
            .field("encryption_kid", &self.encryption_kid())
            .finish()
    }
}

fn derive(
    seed: &PerTeamKeySeed,
    context: &[u8],
    generation: u32,
) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let mut mac = HmacSha256::new_from_slice(seed.as_bytes())
        .map_err(|e| KeyError::invalid_key(format!("HMAC init failed: {}", e)))?;
    mac.update(context);
    mac.update(&generation.to_be_bytes());

    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

//! Device key provider backed by a local device secret

use async_trait::async_trait;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::error::StorageError;
use crate::domain::storage::DeviceKeyProvider;

const DEVICE_KEY_SALT: &[u8] = b"teamchain-device-key-v1";

/// Derives per-purpose symmetric keys from the device's secret key with
/// HKDF-SHA256, using the purpose context as HKDF info
pub struct HkdfDeviceKeyProvider {
    device_secret: Zeroizing<[u8; 32]>,
}

impl HkdfDeviceKeyProvider {
    pub fn new(device_secret: [u8; 32]) -> Self {
        Self {
            device_secret: Zeroizing::new(device_secret),
        }
    }
}

impl std::fmt::Debug for HkdfDeviceKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HkdfDeviceKeyProvider")
            .field("device_secret", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl DeviceKeyProvider for HkdfDeviceKeyProvider {
    async fn derive_symmetric_key(&self, context: &str) -> Result<[u8; 32], StorageError> {
        let hk = Hkdf::<Sha256>::new(Some(DEVICE_KEY_SALT), &self.device_secret[..]);
        let mut okm = [0u8; 32];
        hk.expand(context.as_bytes(), &mut okm)
            .map_err(|e| StorageError::device_key(format!("HKDF expand failed: {}", e)))?;

        Ok(okm)
    }
}

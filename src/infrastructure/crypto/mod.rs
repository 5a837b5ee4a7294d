//! Symmetric crypto helpers shared by the key box and the disk cache

mod aead;
mod device_key;

pub use aead::{AeadError, SecretBox, NONCE_SIZE};
pub use device_key::HkdfDeviceKeyProvider;

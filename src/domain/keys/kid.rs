//! Key identifiers

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use x25519_dalek::PublicKey;

use crate::domain::error::KeyError;

const KID_VERSION: u8 = 0x01;
const KID_SUFFIX: u8 = 0x0a;
const KID_TYPE_ED25519: u8 = 0x20;
const KID_TYPE_X25519: u8 = 0x21;
const KID_BYTES: usize = 35;

/// Key ID: hex of `01 || type || public key || 0a`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kid(String);

impl Kid {
    pub fn parse(value: impl Into<String>) -> Result<Self, KeyError> {
        let value = value.into();
        let bytes = hex::decode(&value)
            .map_err(|e| KeyError::invalid_key(format!("kid is not hex: {}", e)))?;

        if bytes.len() != KID_BYTES || bytes[0] != KID_VERSION || bytes[KID_BYTES - 1] != KID_SUFFIX
        {
            return Err(KeyError::invalid_key(format!("malformed kid {}", value)));
        }

        if bytes[1] != KID_TYPE_ED25519 && bytes[1] != KID_TYPE_X25519 {
            return Err(KeyError::invalid_key(format!(
                "unknown kid type {:02x}",
                bytes[1]
            )));
        }

        Ok(Self(value.to_lowercase()))
    }

    pub fn from_signing_key(key: &VerifyingKey) -> Self {
        Self::from_parts(KID_TYPE_ED25519, key.as_bytes())
    }

    pub fn from_encryption_key(key: &PublicKey) -> Self {
        Self::from_parts(KID_TYPE_X25519, key.as_bytes())
    }

    fn from_parts(typ: u8, key: &[u8; 32]) -> Self {
        let mut bytes = Vec::with_capacity(KID_BYTES);
        bytes.push(KID_VERSION);
        bytes.push(typ);
        bytes.extend_from_slice(key);
        bytes.push(KID_SUFFIX);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn key_bytes(&self, expected_type: u8) -> Result<[u8; 32], KeyError> {
        let bytes = hex::decode(&self.0)
            .map_err(|e| KeyError::invalid_key(format!("kid is not hex: {}", e)))?;

        if bytes[1] != expected_type {
            return Err(KeyError::invalid_key(format!(
                "kid {} has type {:02x}, expected {:02x}",
                self.0, bytes[1], expected_type
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes[2..34]);
        Ok(key)
    }

    /// The Ed25519 public key this kid names
    pub fn verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        let bytes = self.key_bytes(KID_TYPE_ED25519)?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeyError::invalid_key(format!("bad signing key: {}", e)))
    }

    /// The X25519 public key this kid names
    pub fn encryption_key(&self) -> Result<PublicKey, KeyError> {
        Ok(PublicKey::from(self.key_bytes(KID_TYPE_X25519)?))
    }

    /// Constant-time equality
    pub fn secure_eq(&self, other: &Kid) -> bool {
        let a = self.0.as_bytes();
        let b = other.0.as_bytes();

        if a.len() != b.len() {
            return false;
        }

        a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl TryFrom<String> for Kid {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Kid> for String {
    fn from(kid: Kid) -> Self {
        kid.0
    }
}

impl std::fmt::Display for Kid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use x25519_dalek::StaticSecret;

    #[test]
    fn test_signing_kid_round_trips_to_key() {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let kid = Kid::from_signing_key(&signing.verifying_key());

        assert!(kid.as_str().starts_with("0120"));
        assert!(kid.as_str().ends_with("0a"));
        assert_eq!(kid.verifying_key().unwrap(), signing.verifying_key());
        assert_eq!(Kid::parse(kid.as_str()).unwrap(), kid);
    }

    #[test]
    fn test_encryption_kid_has_dh_type() {
        let secret = StaticSecret::from([9u8; 32]);
        let kid = Kid::from_encryption_key(&PublicKey::from(&secret));

        assert!(kid.as_str().starts_with("0121"));
        assert_eq!(kid.encryption_key().unwrap(), PublicKey::from(&secret));
        assert!(kid.verifying_key().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Kid::parse("zz").is_err());
        assert!(Kid::parse("0120").is_err());
        assert!(Kid::parse(format!("01ff{}0a", "00".repeat(32))).is_err());
    }

    #[test]
    fn test_secure_eq() {
        let a = Kid::from_signing_key(&SigningKey::from_bytes(&[1u8; 32]).verifying_key());
        let b = Kid::from_signing_key(&SigningKey::from_bytes(&[2u8; 32]).verifying_key());
        assert!(a.secure_eq(&a.clone()));
        assert!(!a.secure_eq(&b));
    }
}

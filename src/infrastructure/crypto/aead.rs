//! ChaCha20-Poly1305 secret box

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use thiserror::Error;
use zeroize::Zeroizing;

pub const NONCE_SIZE: usize = 12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AeadError {
    #[error("AEAD encrypt failed")]
    Encryption,

    #[error("AEAD decrypt failed")]
    Decryption,

    #[error("Invalid nonce length: expected {expected}, got {got}")]
    InvalidNonce { expected: usize, got: usize },

    #[error("Data too short")]
    Truncated,
}

/// Symmetric authenticated encryption under one 32-byte key.
/// Nonces are random per message.
pub struct SecretBox {
    cipher: ChaCha20Poly1305,
}

impl SecretBox {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Encrypt and return (nonce, ciphertext)
    pub fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>), AeadError> {
        let nonce_bytes: [u8; NONCE_SIZE] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| AeadError::Encryption)?;

        Ok((nonce_bytes, ciphertext))
    }

    pub fn open(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, AeadError> {
        if nonce.len() != NONCE_SIZE {
            return Err(AeadError::InvalidNonce {
                expected: NONCE_SIZE,
                got: nonce.len(),
            });
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AeadError::Decryption)?;

        Ok(Zeroizing::new(plaintext))
    }

    /// Encrypt and return (nonce || ciphertext)
    pub fn seal_combined(&self, plaintext: &[u8]) -> Result<Vec<u8>, AeadError> {
        let (nonce, ciphertext) = self.seal(plaintext)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt (nonce || ciphertext)
    pub fn open_combined(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, AeadError> {
        if data.len() < NONCE_SIZE {
            return Err(AeadError::Truncated);
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        self.open(nonce, ciphertext)
    }
}

//! Encrypted per-team key delivery

use serde::{Deserialize, Serialize};

use super::kid::Kid;

/// One generation's team secret, encrypted for one recipient's per-user key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamBox {
    pub generation: u32,
    /// Which of the recipient's per-user keys this box is sealed to
    pub per_user_key_seqno: u64,
    /// Sender's X25519 key
    pub sender_kid: Kid,
    /// Base64 nonce
    pub nonce: String,
    /// Base64 ciphertext
    pub ctext: String,
}

//! Sealing and unsealing team boxes between per-user X25519 keys

use base64::{engine::general_purpose::STANDARD, Engine};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::domain::error::KeyError;
use crate::domain::keys::{Kid, TeamBox};
use crate::domain::team::PerTeamKeySeed;
use crate::infrastructure::crypto::SecretBox;

const BOX_CONTEXT: &[u8] = b"teamchain-team-box-1";

fn box_key(secret: &StaticSecret, peer: &PublicKey) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let shared = secret.diffie_hellman(peer);

    if !shared.was_contributory() {
        return Err(KeyError::decryption("non-contributory key exchange"));
    }

    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(BOX_CONTEXT, &mut okm[..])
        .map_err(|e| KeyError::invalid_key(format!("HKDF expand failed: {}", e)))?;

    Ok(okm)
}

/// Encrypt a generation's seed to one recipient's per-user encryption key
pub fn seal_team_box(
    seed: &PerTeamKeySeed,
    generation: u32,
    sender: &StaticSecret,
    recipient_kid: &Kid,
    recipient_seqno: u64,
) -> Result<TeamBox, KeyError> {
    let recipient = recipient_kid.encryption_key()?;
    let key = box_key(sender, &recipient)?;

    let (nonce, ctext) = SecretBox::new(&key)
        .seal(seed.as_bytes())
        .map_err(|e| KeyError::invalid_key(e.to_string()))?;

    Ok(TeamBox {
        generation,
        per_user_key_seqno: recipient_seqno,
        sender_kid: Kid::from_encryption_key(&PublicKey::from(sender)),
        nonce: STANDARD.encode(nonce),
        ctext: STANDARD.encode(ctext),
    })
}

/// Decrypt a team box with the recipient's per-user secret. Says nothing about
/// whether the secret matches the chain; see `open_team_box` for that.
pub fn unseal_team_box(
    team_box: &TeamBox,
    recipient: &StaticSecret,
) -> Result<PerTeamKeySeed, KeyError> {
    let sender = team_box.sender_kid.encryption_key()?;
    let key = box_key(recipient, &sender)?;

    let nonce = STANDARD
        .decode(&team_box.nonce)
        .map_err(|e| KeyError::decryption(format!("bad nonce encoding: {}", e)))?;
    let ctext = STANDARD
        .decode(&team_box.ctext)
        .map_err(|e| KeyError::decryption(format!("bad ciphertext encoding: {}", e)))?;

    let plaintext = SecretBox::new(&key)
        .open(&nonce, &ctext)
        .map_err(|e| KeyError::decryption(e.to_string()))?;

    PerTeamKeySeed::from_slice(&plaintext)
        .ok_or_else(|| KeyError::invalid_key("team secret must be 32 bytes"))
}

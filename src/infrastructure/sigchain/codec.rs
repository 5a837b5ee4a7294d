//! Raw server statements to typed chain links

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signature, Verifier};
use tracing::warn;

use crate::domain::error::ChainError;
use crate::domain::link::{ChainLink, LinkId, RawChainLink, SignedPayload};

/// Verify one raw link's signature and parse its payload
pub fn parse_chain_link(raw: &RawChainLink) -> Result<ChainLink, ChainError> {
    let verifying_key = raw
        .kid
        .verifying_key()
        .map_err(|e| ChainError::malformed(format!("link kid: {}", e)))?;

    let sig_bytes = STANDARD
        .decode(&raw.sig)
        .map_err(|e| ChainError::malformed(format!("link signature encoding: {}", e)))?;
    let signature =
        Signature::from_slice(&sig_bytes).map_err(|_| ChainError::BadSignature)?;

    if verifying_key
        .verify(raw.payload_json.as_bytes(), &signature)
        .is_err()
    {
        warn!(kid = %raw.kid, "Chain link signature does not verify");
        return Err(ChainError::BadSignature);
    }

    let payload: SignedPayload = serde_json::from_str(&raw.payload_json)
        .map_err(|e| ChainError::malformed(format!("link payload: {}", e)))?;

    Ok(ChainLink {
        seqno: payload.seqno,
        id: LinkId::from_payload(raw.payload_json.as_bytes()),
        prev: payload.prev,
        signer: payload.signer,
        signing_kid: raw.kid.clone(),
        payload: payload.body,
    })
}

/// Parse every link, failing on the first bad one
pub fn parse_chain(raw: &[RawChainLink]) -> Result<Vec<ChainLink>, ChainError> {
    raw.iter().map(parse_chain_link).collect()
}

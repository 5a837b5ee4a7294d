//! Team sigchain verification
//!
//! `codec` checks link signatures and parses payloads; `signers` binds each
//! link's key to the user it names; `player` folds the parsed links into a
//! `TeamState`, enforcing sequencing, hash linking, role authorization and
//! per-team key generations.

mod codec;
mod player;
mod signers;

pub use codec::{parse_chain, parse_chain_link};
pub use player::fold;
pub use signers::verify_signers;

use crate::domain::error::ChainError;
use crate::domain::identity::IdentityDirectory;
use crate::domain::link::RawChainLink;
use crate::domain::team::TeamState;

/// Parse and fold raw links whose signers are already trusted
pub fn play_raw(prior: Option<TeamState>, raw: &[RawChainLink]) -> Result<TeamState, ChainError> {
    let links = parse_chain(raw)?;
    fold(prior, &links)
}

/// Parse raw server links, bind them to their signers' published keys and fold
pub async fn play_verified(
    prior: Option<TeamState>,
    raw: &[RawChainLink],
    directory: &dyn IdentityDirectory,
) -> Result<TeamState, ChainError> {
    let links = parse_chain(raw)?;
    verify_signers(&links, directory).await?;
    fold(prior, &links)
}

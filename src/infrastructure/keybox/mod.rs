//! Per-team key boxes: derivation, sealing and the checked opener

mod derive;
mod opener;
mod sealed;

pub use derive::TeamKeyManager;
pub use opener::open_team_box;
pub use sealed::{seal_team_box, unseal_team_box};

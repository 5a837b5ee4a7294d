//! Key domain - key identifiers, per-user keys and team boxes

mod kid;
mod per_user;
mod team_box;

pub use kid::Kid;
pub use per_user::{current_per_user_key, PerUserKey, PerUserKeyring, PerUserSecretKeys};
pub use team_box::TeamBox;

#[cfg(test)]
pub use per_user::mock;

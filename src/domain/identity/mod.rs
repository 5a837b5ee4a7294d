//! Identity domain - external user directory

mod directory;

pub use directory::{IdentityDirectory, Uid, UserKeyHistory};

#[cfg(test)]
pub use directory::mock;

//! Identity directory adapters

mod cached;
mod file;

pub use cached::CachedIdentityDirectory;
pub use file::FileIdentityDirectory;

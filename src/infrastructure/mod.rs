//! Infrastructure layer - chain verification, key handling and storage implementations

pub mod crypto;
pub mod identity;
pub mod keybox;
pub mod keyring;
pub mod kv;
pub mod loader;
pub mod logging;
pub mod member_set;
pub mod server;
pub mod sigchain;
pub mod storage;

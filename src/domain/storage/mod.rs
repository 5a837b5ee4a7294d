//! Storage domain - local key-value store and device key abstractions

mod entity;
mod repository;

pub use entity::{DbKey, DbKeyType};
pub use repository::{DeviceKeyProvider, RawStore};

#[cfg(test)]
pub use repository::mock;

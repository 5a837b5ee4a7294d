//! Two-tier cache of verified team data

mod disk;
mod memory;
mod tiered;

pub use disk::{DiskStorage, DISK_STORAGE_VERSION};
pub use memory::{MemoryStorage, DEFAULT_MEMORY_CAPACITY};
pub use tiered::Storage;

//! Raw key-value store implementations

mod fs;
mod in_memory;

pub use fs::FsRawStore;
pub use in_memory::InMemoryRawStore;

//! Team server adapters

mod file;

pub use file::FileTeamServer;

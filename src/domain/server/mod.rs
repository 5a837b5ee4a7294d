//! Server domain - fetch contract with the team server

mod client;

pub use client::{AppStatus, RawTeam, TeamFetchArg, TeamServer};

#[cfg(test)]
pub use client::MockTeamServer;

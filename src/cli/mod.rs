//! CLI module for teamchain
//!
//! Offline tools around team sigchains:
//! - `verify`: fold a chain file and print the verified team state
//! - `team-id`: print the root team id for a team name
//! - `load`: run the loader against a saved server response

pub mod load;
pub mod team_id;
pub mod verify;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// teamchain - verify and cache team sigchains
#[derive(Parser)]
#[command(name = "teamchain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify a JSON array of raw chain links
    Verify(verify::VerifyArgs),

    /// Print the team id of a root team name
    TeamId(team_id::TeamIdArgs),

    /// Load a team through the cache from a saved server response
    Load(load::LoadArgs),
}

pub(crate) fn init(config: &AppConfig) {
    logging::init_logging(&config.logging);
}

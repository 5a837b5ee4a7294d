//! Team loader: cache lookup, server sync, verification and cache population

mod arg;
mod team_loader;

pub use arg::LoadTeamArg;
pub use team_loader::TeamLoader;

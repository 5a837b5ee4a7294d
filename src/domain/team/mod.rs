//! Team domain module
//!
//! Identifiers, roles and the verified state folded from a team's sigchain.

mod entity;
mod state;
mod validation;

pub use entity::{TeamId, TeamName, TeamRole, UserVersion};
pub use state::{
    MemberChecker, PerTeamKey, PerTeamKeySeed, PerTeamKeySeedItem, ReaderKeyMask, TeamData,
    TeamMembers, TeamState,
};
pub use validation::{
    validate_team_id, validate_team_name_part, validate_username, TeamValidationError,
};

//! Team and user identifier validation

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team ID must be {0} hex characters")]
    InvalidIdLength(usize),

    #[error("Team ID can only contain lowercase hex characters")]
    InvalidIdCharacters,

    #[error("Team ID has unknown type suffix {0:02x}")]
    InvalidIdSuffix(u8),

    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name part '{0}' must be between {1} and {2} characters")]
    InvalidNamePartLength(String, usize, usize),

    #[error("Team name part '{0}' can only contain alphanumeric characters and underscores")]
    InvalidNameCharacters(String),

    #[error("Team name part '{0}' cannot start with an underscore")]
    InvalidNameFormat(String),

    #[error("Subteam '{0}' has no root team ID")]
    SubteamHasNoRootId(String),

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username '{0}' contains invalid characters")]
    InvalidUsernameCharacters(String),

    #[error("Invalid user version '{0}', expected username%eldest_seqno")]
    InvalidUserVersion(String),
}

pub(crate) const TEAM_ID_HEX_LEN: usize = 32;
pub(crate) const TEAM_ID_SUFFIX_ROOT: u8 = 0x24;
pub(crate) const TEAM_ID_SUFFIX_SUBTEAM: u8 = 0x25;

const MIN_NAME_PART_LENGTH: usize = 2;
const MAX_NAME_PART_LENGTH: usize = 16;

/// Validate a team ID
pub fn validate_team_id(id: &str) -> Result<(), TeamValidationError> {
    if id.len() != TEAM_ID_HEX_LEN {
        return Err(TeamValidationError::InvalidIdLength(TEAM_ID_HEX_LEN));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        return Err(TeamValidationError::InvalidIdCharacters);
    }

    let suffix = u8::from_str_radix(&id[TEAM_ID_HEX_LEN - 2..], 16)
        .map_err(|_| TeamValidationError::InvalidIdCharacters)?;

    if suffix != TEAM_ID_SUFFIX_ROOT && suffix != TEAM_ID_SUFFIX_SUBTEAM {
        return Err(TeamValidationError::InvalidIdSuffix(suffix));
    }

    Ok(())
}

/// Validate one dot-separated part of a team name
pub fn validate_team_name_part(part: &str) -> Result<(), TeamValidationError> {
    if part.len() < MIN_NAME_PART_LENGTH || part.len() > MAX_NAME_PART_LENGTH {
        return Err(TeamValidationError::InvalidNamePartLength(
            part.to_string(),
            MIN_NAME_PART_LENGTH,
            MAX_NAME_PART_LENGTH,
        ));
    }

    if !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TeamValidationError::InvalidNameCharacters(part.to_string()));
    }

    if part.starts_with('_') {
        return Err(TeamValidationError::InvalidNameFormat(part.to_string()));
    }

    Ok(())
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), TeamValidationError> {
    if username.is_empty() {
        return Err(TeamValidationError::EmptyUsername);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(TeamValidationError::InvalidUsernameCharacters(
            username.to_string(),
        ));
    }

    Ok(())
}

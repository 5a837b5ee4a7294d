//! Team identifiers, names, roles and user versions

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::validation::{
    validate_team_id, validate_team_name_part, validate_username, TeamValidationError,
    TEAM_ID_HEX_LEN, TEAM_ID_SUFFIX_ROOT, TEAM_ID_SUFFIX_SUBTEAM,
};

/// Team identifier - 16 bytes as lowercase hex, last byte marks root or subteam
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ID names a subteam rather than a root team
    pub fn is_subteam(&self) -> bool {
        self.0[TEAM_ID_HEX_LEN - 2..] == format!("{:02x}", TEAM_ID_SUFFIX_SUBTEAM)
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable team name, dot-separated for subteams (`acme.ops`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName {
    parts: Vec<String>,
}

impl TeamName {
    /// Parse and normalize a team name
    pub fn parse(name: &str) -> Result<Self, TeamValidationError> {
        if name.is_empty() {
            return Err(TeamValidationError::EmptyName);
        }

        let parts = name
            .split('.')
            .map(|part| {
                validate_team_name_part(part)?;
                Ok(part.to_lowercase())
            })
            .collect::<Result<Vec<_>, TeamValidationError>>()?;

        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn is_subteam(&self) -> bool {
        self.parts.len() > 1
    }

    /// The root team's ID. Only defined for top-level teams.
    pub fn to_team_id(&self) -> Result<TeamId, TeamValidationError> {
        if self.is_subteam() {
            return Err(TeamValidationError::SubteamHasNoRootId(self.to_string()));
        }

        let digest = Sha256::digest(self.to_string().as_bytes());
        let mut bytes = [0u8; 16];
        bytes[..15].copy_from_slice(&digest[..15]);
        bytes[15] = TEAM_ID_SUFFIX_ROOT;

        Ok(TeamId(hex::encode(bytes)))
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.to_string()
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

/// Role of a user within a team, ordered by privilege
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Not a member (removed or never added)
    #[default]
    None,
    Reader,
    Writer,
    Admin,
    Owner,
}

impl TeamRole {
    /// Check if this role can change other members' roles
    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Check if this role can grant or revoke the owner role
    pub fn can_manage_owners(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Check if this role is any kind of membership
    pub fn is_member(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Reader => write!(f, "reader"),
            Self::Writer => write!(f, "writer"),
            Self::Admin => write!(f, "admin"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// One identity-epoch of a user. A reset account keeps its username but gets a
/// new eldest seqno, and with it a new UserVersion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserVersion {
    username: String,
    eldest_seqno: u64,
}

impl UserVersion {
    pub fn new(username: impl Into<String>, eldest_seqno: u64) -> Result<Self, TeamValidationError> {
        let username = username.into().to_lowercase();
        validate_username(&username)?;

        if eldest_seqno == 0 {
            return Err(TeamValidationError::InvalidUserVersion(format!(
                "{}%0",
                username
            )));
        }

        Ok(Self {
            username,
            eldest_seqno,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn eldest_seqno(&self) -> u64 {
        self.eldest_seqno
    }

    /// Same account, possibly a different version
    pub fn same_account(&self, other: &UserVersion) -> bool {
        self.username == other.username
    }
}

impl TryFrom<String> for UserVersion {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (username, seqno) = value
            .split_once('%')
            .ok_or_else(|| TeamValidationError::InvalidUserVersion(value.clone()))?;
        let eldest_seqno = seqno
            .parse::<u64>()
            .map_err(|_| TeamValidationError::InvalidUserVersion(value.clone()))?;

        Self::new(username, eldest_seqno)
    }
}

impl From<UserVersion> for String {
    fn from(uv: UserVersion) -> Self {
        uv.to_string()
    }
}

impl std::fmt::Display for UserVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%{}", self.username, self.eldest_seqno)
    }
}

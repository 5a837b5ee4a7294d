//! Typed team chain links and the sections they carry

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::error::ChainError;
use crate::domain::keys::Kid;
use crate::domain::team::{TeamId, TeamName, TeamRole, UserVersion};

/// Hex SHA-256 of a link's signed payload; the next link's `prev` must match it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn from_payload(payload: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(payload)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A statement exactly as the server hands it over: signed payload bytes plus
/// the detached signature and the key that made it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChainLink {
    pub payload_json: String,
    /// Base64 Ed25519 signature over `payload_json`
    pub sig: String,
    pub kid: Kid,
}

/// The JSON object inside `payload_json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub seqno: u64,
    pub prev: Option<LinkId>,
    pub signer: UserVersion,
    pub body: LinkPayload,
}

/// One parsed, signature-checked chain link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub seqno: u64,
    pub id: LinkId,
    pub prev: Option<LinkId>,
    pub signer: UserVersion,
    pub signing_kid: Kid,
    pub payload: LinkPayload,
}

/// What a link does to the team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkPayload {
    /// Team creation; only valid at seqno 1
    Root { team: TeamSection },
    /// Role grants, changes and removals
    ChangeMembership { team: TeamSection },
    /// New per-team key generation with no membership change
    RotateKey { team: TeamSection },
    /// The signer removes itself
    Leave { team: TeamSection },
}

impl LinkPayload {
    pub fn team(&self) -> &TeamSection {
        match self {
            Self::Root { team }
            | Self::ChangeMembership { team }
            | Self::RotateKey { team }
            | Self::Leave { team } => team,
        }
    }

    pub fn link_type(&self) -> &'static str {
        match self {
            Self::Root { .. } => "root",
            Self::ChangeMembership { .. } => "change_membership",
            Self::RotateKey { .. } => "rotate_key",
            Self::Leave { .. } => "leave",
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root { .. })
    }
}

/// The `team` object of a link body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSection {
    pub id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<TeamName>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub members: Option<MemberSection>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub per_team_key: Option<PerTeamKeySection>,
}

impl TeamSection {
    pub fn new(id: TeamId) -> Self {
        Self {
            id,
            name: None,
            members: None,
            per_team_key: None,
        }
    }

    pub fn with_name(mut self, name: TeamName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_members(mut self, members: MemberSection) -> Self {
        self.members = Some(members);
        self
    }

    pub fn with_per_team_key(mut self, key: PerTeamKeySection) -> Self {
        self.per_team_key = Some(key);
        self
    }
}

/// Role-partitioned member lists. An empty bucket is absent, never `[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSection {
    #[serde(rename = "owner", skip_serializing_if = "Option::is_none", default)]
    pub owners: Option<Vec<UserVersion>>,
    #[serde(rename = "admin", skip_serializing_if = "Option::is_none", default)]
    pub admins: Option<Vec<UserVersion>>,
    #[serde(rename = "writer", skip_serializing_if = "Option::is_none", default)]
    pub writers: Option<Vec<UserVersion>>,
    #[serde(rename = "reader", skip_serializing_if = "Option::is_none", default)]
    pub readers: Option<Vec<UserVersion>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub none: Option<Vec<UserVersion>>,
}

impl MemberSection {
    /// Every (user, new role) pair this section assigns
    pub fn changes(&self) -> Vec<(&UserVersion, TeamRole)> {
        let buckets = [
            (&self.owners, TeamRole::Owner),
            (&self.admins, TeamRole::Admin),
            (&self.writers, TeamRole::Writer),
            (&self.readers, TeamRole::Reader),
            (&self.none, TeamRole::None),
        ];

        buckets
            .into_iter()
            .flat_map(|(bucket, role)| {
                bucket
                    .iter()
                    .flatten()
                    .map(move |uv| (uv, role))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }

    pub fn has_removals(&self) -> bool {
        self.none.as_ref().is_some_and(|n| !n.is_empty())
    }

    /// A user may appear at most once across all buckets
    pub fn check_unique(&self) -> Result<(), ChainError> {
        let mut seen = HashSet::new();
        for (uv, _) in self.changes() {
            if !seen.insert(uv.username()) {
                return Err(ChainError::malformed(format!(
                    "{} appears more than once in one members section",
                    uv.username()
                )));
            }
        }
        Ok(())
    }
}

/// A new per-team key generation's public keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTeamKeySection {
    pub generation: u32,
    pub signing_kid: Kid,
    pub encryption_kid: Kid,
}

//! Verified team state and the loader's result bundle

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use super::entity::{TeamId, TeamName, TeamRole, UserVersion};
use crate::domain::keys::Kid;
use crate::domain::link::LinkId;

/// Public record of one per-team key generation, as declared on the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTeamKey {
    pub generation: u32,
    /// Chain seqno of the link that introduced this generation
    pub seqno: u64,
    pub signing_kid: Kid,
    pub encryption_kid: Kid,
}

/// Folded result of a team sigchain. Only the sigchain player builds these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    name: Option<TeamName>,
    last_seqno: u64,
    last_link_id: LinkId,
    user_roles: BTreeMap<UserVersion, TeamRole>,
    per_team_keys: Vec<PerTeamKey>,
}

impl TeamState {
    pub(crate) fn new(id: TeamId, name: Option<TeamName>, seqno: u64, link_id: LinkId) -> Self {
        Self {
            id,
            name,
            last_seqno: seqno,
            last_link_id: link_id,
            user_roles: BTreeMap::new(),
            per_team_keys: Vec::new(),
        }
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> Option<&TeamName> {
        self.name.as_ref()
    }

    pub fn last_seqno(&self) -> u64 {
        self.last_seqno
    }

    pub fn last_link_id(&self) -> &LinkId {
        &self.last_link_id
    }

    pub fn user_roles(&self) -> &BTreeMap<UserVersion, TeamRole> {
        &self.user_roles
    }

    /// Role of exactly this user version; other versions of the account don't count
    pub fn role_of(&self, uv: &UserVersion) -> TeamRole {
        self.user_roles.get(uv).copied().unwrap_or(TeamRole::None)
    }

    /// The member version currently holding a role under `username`
    pub fn user_version_by_username(&self, username: &str) -> Option<&UserVersion> {
        self.user_roles
            .keys()
            .find(|uv| uv.username() == username.to_lowercase())
    }

    pub fn members(&self) -> TeamMembers {
        let mut members = TeamMembers::default();

        for (uv, role) in &self.user_roles {
            let bucket = match role {
                TeamRole::Owner => &mut members.owners,
                TeamRole::Admin => &mut members.admins,
                TeamRole::Writer => &mut members.writers,
                TeamRole::Reader => &mut members.readers,
                TeamRole::None => continue,
            };
            bucket.push(uv.clone());
        }

        members
    }

    pub fn per_team_keys(&self) -> &[PerTeamKey] {
        &self.per_team_keys
    }

    pub fn per_team_key_at_generation(&self, generation: u32) -> Option<&PerTeamKey> {
        self.per_team_keys
            .iter()
            .find(|k| k.generation == generation)
    }

    pub fn latest_per_team_key(&self) -> Option<&PerTeamKey> {
        self.per_team_keys.last()
    }

    pub fn latest_generation(&self) -> u32 {
        self.latest_per_team_key().map_or(0, |k| k.generation)
    }

    // Mutators, used while folding links

    /// A user belongs to a team under one version at a time; granting a role to
    /// a new version drops any older version of the same account.
    pub(crate) fn set_role(&mut self, uv: &UserVersion, role: TeamRole) {
        self.user_roles.retain(|existing, _| !existing.same_account(uv));

        if role.is_member() {
            self.user_roles.insert(uv.clone(), role);
        }
    }

    pub(crate) fn push_per_team_key(&mut self, key: PerTeamKey) {
        self.per_team_keys.push(key);
    }

    pub(crate) fn advance(&mut self, seqno: u64, link_id: LinkId) {
        self.last_seqno = seqno;
        self.last_link_id = link_id;
    }
}

/// Current members grouped by role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMembers {
    pub owners: Vec<UserVersion>,
    pub admins: Vec<UserVersion>,
    pub writers: Vec<UserVersion>,
    pub readers: Vec<UserVersion>,
}

impl TeamMembers {
    pub fn all_usernames(&self) -> Vec<String> {
        self.owners
            .iter()
            .chain(&self.admins)
            .chain(&self.writers)
            .chain(&self.readers)
            .map(|uv| uv.username().to_string())
            .collect()
    }

    pub fn contains_username(&self, username: &str) -> bool {
        let username = username.to_lowercase();
        self.owners
            .iter()
            .chain(&self.admins)
            .chain(&self.writers)
            .chain(&self.readers)
            .any(|uv| uv.username() == username)
    }
}

/// Answers "is this user already a member" for member-set diffing
#[async_trait]
pub trait MemberChecker: Send + Sync {
    async fn is_member(&self, username: &str) -> bool;
}

#[async_trait]
impl MemberChecker for TeamState {
    async fn is_member(&self, username: &str) -> bool {
        self.user_version_by_username(username).is_some()
    }
}

#[async_trait]
impl MemberChecker for TeamMembers {
    async fn is_member(&self, username: &str) -> bool {
        self.contains_username(username)
    }
}

/// Raw 32-byte team secret for one generation. Zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PerTeamKeySeed([u8; 32]);

impl PerTeamKeySeed {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Drop for PerTeamKeySeed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for PerTeamKeySeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PerTeamKeySeed(<REDACTED>)")
    }
}

impl Serialize for PerTeamKeySeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PerTeamKeySeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes)
            .ok_or_else(|| serde::de::Error::custom("per-team key seed must be 32 bytes"))
    }
}

/// Recovered secret for one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTeamKeySeedItem {
    pub seed: PerTeamKeySeed,
    pub generation: u32,
    pub seqno: u64,
}

/// Opaque per-reader visibility token, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderKeyMask {
    pub application: i32,
    pub generation: u32,
    pub mask: String,
}

/// What the loader hands to callers and what the cache stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamData {
    pub chain: TeamState,
    pub per_team_key_seeds: Vec<PerTeamKeySeedItem>,
    pub reader_key_masks: Vec<ReaderKeyMask>,
    pub loaded_at: DateTime<Utc>,
}

impl TeamData {
    pub fn id(&self) -> &TeamId {
        self.chain.id()
    }

    pub fn seed_at_generation(&self, generation: u32) -> Option<&PerTeamKeySeedItem> {
        self.per_team_key_seeds
            .iter()
            .find(|s| s.generation == generation)
    }

    /// Insert or replace the seed for its generation, keeping seeds sorted
    pub fn merge_seed(&mut self, item: PerTeamKeySeedItem) {
        self.per_team_key_seeds
            .retain(|s| s.generation != item.generation);
        self.per_team_key_seeds.push(item);
        self.per_team_key_seeds.sort_by_key(|s| s.generation);
    }
}

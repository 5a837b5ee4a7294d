//! Resolves a role-partitioned membership request into members and recipients

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::recipients::Recipients;
use crate::domain::error::ResolutionError;
use crate::domain::identity::IdentityDirectory;
use crate::domain::keys::PerUserKey;
use crate::domain::link::{MemberSection, TeamSection};
use crate::domain::team::{MemberChecker, TeamId, TeamMembers, UserVersion};

/// Usernames to place in each role; `none` removes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamChangeReq {
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
    #[serde(default)]
    pub readers: Vec<String>,
    #[serde(default)]
    pub none: Vec<String>,
}

/// A resolved member: the user's current version and per-user key.
/// Removed users may have no per-user key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub version: UserVersion,
    pub per_user_key: Option<PerUserKey>,
}

#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    pub owners: Vec<Member>,
    pub admins: Vec<Member>,
    pub writers: Vec<Member>,
    pub readers: Vec<Member>,
    pub none: Vec<Member>,
    recipients: Recipients,
}

impl MemberSet {
    /// Resolve every username in `req`. One failed lookup fails the whole set.
    pub async fn build(
        directory: &dyn IdentityDirectory,
        req: &TeamChangeReq,
    ) -> Result<Self, ResolutionError> {
        let mut set = Self::default();

        // Removals first, so no later bucket can put them back in recipients
        set.none = load_bucket(directory, &req.none, false).await?;
        for member in &set.none {
            set.recipients.exclude(member.version.username());
        }

        set.owners = load_bucket(directory, &req.owners, true).await?;
        set.admins = load_bucket(directory, &req.admins, true).await?;
        set.writers = load_bucket(directory, &req.writers, true).await?;
        set.readers = load_bucket(directory, &req.readers, true).await?;

        let stored: Vec<(String, PerUserKey)> = set
            .owners
            .iter()
            .chain(&set.admins)
            .chain(&set.writers)
            .chain(&set.readers)
            .filter_map(|m| {
                m.per_user_key
                    .clone()
                    .map(|key| (m.version.username().to_string(), key))
            })
            .collect();
        for (username, key) in stored {
            set.recipients.insert(&username, key);
        }

        debug!(
            recipients = set.recipients.len(),
            removals = set.none.len(),
            "Built member set"
        );

        Ok(set)
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    /// Drop recipients who are already members
    pub async fn remove_existing_members(&mut self, checker: &dyn MemberChecker) {
        for username in self.recipients.usernames() {
            if checker.is_member(&username).await {
                self.recipients.remove(&username);
            }
        }
    }

    /// Add every surviving existing member that isn't a recipient yet
    pub async fn add_remaining_recipients(
        &mut self,
        directory: &dyn IdentityDirectory,
        existing: &TeamMembers,
    ) -> Result<(), ResolutionError> {
        let missing: Vec<String> = existing
            .all_usernames()
            .into_iter()
            .filter(|u| !self.recipients.contains(u) && !self.recipients.is_excluded(u))
            .collect();

        let loaded = load_bucket(directory, &missing, true).await?;

        let mut extra = Recipients::new();
        for member in loaded {
            if let Some(key) = member.per_user_key {
                extra.insert(member.version.username(), key);
            }
        }
        self.recipients.merge(extra);

        Ok(())
    }

    /// Render as the `members` section of a new link. Empty buckets are absent.
    pub fn to_section(&self, team_id: TeamId) -> TeamSection {
        TeamSection::new(team_id).with_members(MemberSection {
            owners: versions(&self.owners),
            admins: versions(&self.admins),
            writers: versions(&self.writers),
            readers: versions(&self.readers),
            none: versions(&self.none),
        })
    }

    /// A removal means the per-team key must rotate
    pub fn has_removal(&self) -> bool {
        !self.none.is_empty()
    }
}

fn versions(bucket: &[Member]) -> Option<Vec<UserVersion>> {
    if bucket.is_empty() {
        None
    } else {
        Some(bucket.iter().map(|m| m.version.clone()).collect())
    }
}

async fn load_bucket(
    directory: &dyn IdentityDirectory,
    usernames: &[String],
    store_recipient: bool,
) -> Result<Vec<Member>, ResolutionError> {
    try_join_all(
        usernames
            .iter()
            .map(|username| load_member(directory, username, store_recipient)),
    )
    .await
}

async fn load_member(
    directory: &dyn IdentityDirectory,
    username: &str,
    store_recipient: bool,
) -> Result<Member, ResolutionError> {
    let uid = directory.resolve(username).await?;
    let history = directory.load_key_history(&uid).await?;
    let version = history.user_version()?;
    let per_user_key = history.current_per_user_key().cloned();

    if store_recipient && per_user_key.is_none() {
        return Err(ResolutionError::NoPerUserKey {
            username: username.to_string(),
        });
    }

    Ok(Member {
        version,
        per_user_key,
    })
}

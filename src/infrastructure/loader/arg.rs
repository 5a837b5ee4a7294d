//! Load request and its validation

use serde::{Deserialize, Serialize};

use crate::domain::error::RequestError;
use crate::domain::team::{TeamId, TeamName};

/// Which team to load and how hard to try
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTeamArg {
    pub id: Option<TeamId>,
    pub name: Option<String>,
    /// Ignore the cache and verify the whole chain again
    pub force_full_reload: bool,
    /// Sync with the server even when the cached copy is fresh
    pub force_sync: bool,
    /// Accept a cached copy of any age
    pub stale_ok: bool,
    /// Never contact the server
    pub no_network: bool,
}

impl LoadTeamArg {
    pub fn by_id(id: TeamId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn force_full_reload(mut self) -> Self {
        self.force_full_reload = true;
        self
    }

    pub fn force_sync(mut self) -> Self {
        self.force_sync = true;
        self
    }

    pub fn stale_ok(mut self) -> Self {
        self.stale_ok = true;
        self
    }

    pub fn no_network(mut self) -> Self {
        self.no_network = true;
        self
    }

    /// Validate the request and resolve the team it targets
    pub fn check(&self) -> Result<TeamId, RequestError> {
        let target = match (&self.id, &self.name) {
            (Some(_), Some(_)) => return Err(RequestError::AmbiguousTarget),
            (None, None) => return Err(RequestError::MissingTarget),
            (Some(id), None) => id.clone(),
            (None, Some(name)) => root_team_id(name)?,
        };

        if self.no_network {
            if self.force_full_reload {
                return Err(RequestError::ConflictingFlags {
                    flag: "force_full_reload",
                });
            }
            if self.force_sync {
                return Err(RequestError::ConflictingFlags { flag: "force_sync" });
            }
        }

        Ok(target)
    }
}

fn root_team_id(name: &str) -> Result<TeamId, RequestError> {
    let parsed =
        TeamName::parse(name).map_err(|e| RequestError::InvalidTeamName(e.to_string()))?;

    if parsed.is_subteam() {
        return Err(RequestError::UnsupportedSubteamByName(parsed.to_string()));
    }

    parsed
        .to_team_id()
        .map_err(|e| RequestError::InvalidTeamName(e.to_string()))
}

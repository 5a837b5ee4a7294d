//! Team server seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::NetworkError;
use crate::domain::keys::TeamBox;
use crate::domain::link::RawChainLink;
use crate::domain::team::{ReaderKeyMask, TeamId};

#[cfg(test)]
use mockall::automock;

/// Fetch request: links with seqno greater than `low_seqno` (0 = whole chain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamFetchArg {
    pub team_id: TeamId,
    pub low_seqno: u64,
}

impl TeamFetchArg {
    pub fn from_scratch(team_id: TeamId) -> Self {
        Self {
            team_id,
            low_seqno: 0,
        }
    }

    pub fn incremental(team_id: TeamId, low_seqno: u64) -> Self {
        Self { team_id, low_seqno }
    }
}

/// Application-level status carried in every server response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatus {
    pub code: i32,
    #[serde(default)]
    pub desc: String,
}

impl AppStatus {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Server response for a team fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTeam {
    pub status: AppStatus,
    pub chain: Vec<RawChainLink>,
    #[serde(rename = "box")]
    pub team_box: TeamBox,
    #[serde(default)]
    pub reader_key_masks: Vec<ReaderKeyMask>,
}

impl RawTeam {
    /// Fail with the server's status unless it is OK
    pub fn check_status(&self) -> Result<(), NetworkError> {
        if self.status.is_ok() {
            Ok(())
        } else {
            Err(NetworkError::AppStatus {
                code: self.status.code,
                desc: self.status.desc.clone(),
            })
        }
    }
}

/// Client for the untrusted team server. Retries and deadlines are the
/// implementation's business.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TeamServer: Send + Sync {
    async fn get_team(&self, arg: TeamFetchArg) -> Result<RawTeam, NetworkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        let status = AppStatus {
            code: 2623,
            desc: "team not found".to_string(),
        };
        assert!(!status.is_ok());
        assert!(AppStatus::ok().is_ok());
    }

    #[test]
    fn test_raw_team_box_field_name() {
        let json = serde_json::json!({
            "status": { "code": 0 },
            "chain": [],
            "box": {
                "generation": 1,
                "per_user_key_seqno": 1,
                "sender_kid": format!("0121{}0a", "11".repeat(32)),
                "nonce": "AAAA",
                "ctext": "AAAA"
            }
        });

        let raw: RawTeam = serde_json::from_value(json).unwrap();
        assert_eq!(raw.team_box.generation, 1);
        assert!(raw.reader_key_masks.is_empty());
        assert!(raw.check_status().is_ok());
    }
}

//! Team server backed by a saved response file

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::NetworkError;
use crate::domain::server::{RawTeam, TeamFetchArg, TeamServer};

/// Serves one saved `RawTeam` response. The file holds the whole chain;
/// links at or below `low_seqno` are dropped to mimic an incremental fetch.
#[derive(Debug, Clone)]
pub struct FileTeamServer {
    path: PathBuf,
}

impl FileTeamServer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TeamServer for FileTeamServer {
    async fn get_team(&self, arg: TeamFetchArg) -> Result<RawTeam, NetworkError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| NetworkError::transport(format!("{}: {}", self.path.display(), e)))?;

        let mut raw: RawTeam = serde_json::from_str(&contents)
            .map_err(|e| NetworkError::transport(format!("bad response: {}", e)))?;

        let skip = usize::try_from(arg.low_seqno)
            .unwrap_or(usize::MAX)
            .min(raw.chain.len());
        raw.chain.drain(..skip);

        debug!(
            team_id = %arg.team_id,
            low_seqno = arg.low_seqno,
            links = raw.chain.len(),
            "Served team from file"
        );

        Ok(raw)
    }
}

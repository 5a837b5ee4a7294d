//! Cache-or-server team loading

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::arg::LoadTeamArg;
use crate::config::LoaderConfig;
use crate::domain::error::{ChainError, LoadError};
use crate::domain::identity::IdentityDirectory;
use crate::domain::keys::PerUserKeyring;
use crate::domain::server::{TeamFetchArg, TeamServer};
use crate::domain::team::{TeamData, TeamId};
use crate::infrastructure::keybox::open_team_box;
use crate::infrastructure::sigchain;
use crate::infrastructure::storage::Storage;

#[derive(Debug, Default, Clone, Copy)]
struct LoadStats {
    hit_cache: bool,
    loaded_from_server: bool,
}

/// Single entry point for reading a verified team
pub struct TeamLoader {
    storage: Arc<Storage>,
    server: Arc<dyn TeamServer>,
    directory: Arc<dyn IdentityDirectory>,
    keyring: Arc<dyn PerUserKeyring>,
    freshness: Duration,
}

impl TeamLoader {
    pub fn new(
        storage: Arc<Storage>,
        server: Arc<dyn TeamServer>,
        directory: Arc<dyn IdentityDirectory>,
        keyring: Arc<dyn PerUserKeyring>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            storage,
            server,
            directory,
            keyring,
            freshness: Duration::from_secs(config.freshness_secs),
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Load a team. Never returns partial data; every server result is cached
    /// before it is returned. Dropping the future before it resolves leaves
    /// the cache as it was, since the only write is the final `put`.
    pub async fn load(&self, arg: &LoadTeamArg) -> Result<TeamData, LoadError> {
        let team_id = arg.check()?;
        let mut stats = LoadStats::default();

        let result = self.load_inner(&team_id, arg, &mut stats).await;

        debug!(
            team_id = %team_id,
            hit_cache = stats.hit_cache,
            loaded_from_server = stats.loaded_from_server,
            ok = result.is_ok(),
            "Team load finished"
        );

        result
    }

    async fn load_inner(
        &self,
        team_id: &TeamId,
        arg: &LoadTeamArg,
        stats: &mut LoadStats,
    ) -> Result<TeamData, LoadError> {
        if arg.force_full_reload {
            return self.sync(team_id, None, stats).await;
        }

        let Some(cached) = self.storage.get(team_id).await else {
            if arg.no_network {
                return Err(LoadError::NoNetworkNoCache(team_id.clone()));
            }
            return self.sync(team_id, None, stats).await;
        };

        stats.hit_cache = true;

        if !arg.force_sync && (arg.stale_ok || arg.no_network || self.is_fresh(&cached)) {
            return Ok(cached);
        }

        self.sync(team_id, Some(cached), stats).await
    }

    fn is_fresh(&self, data: &TeamData) -> bool {
        let age = (Utc::now() - data.loaded_at).to_std().unwrap_or_default();
        age < self.freshness
    }

    /// Fetch links past `prior` (or the whole chain), verify, open the box if
    /// it carries a new generation, and cache the result.
    async fn sync(
        &self,
        team_id: &TeamId,
        prior: Option<TeamData>,
        stats: &mut LoadStats,
    ) -> Result<TeamData, LoadError> {
        let fetch = match &prior {
            Some(prior) => TeamFetchArg::incremental(team_id.clone(), prior.chain.last_seqno()),
            None => TeamFetchArg::from_scratch(team_id.clone()),
        };
        let low_seqno = fetch.low_seqno;

        let raw = self.server.get_team(fetch).await?;
        raw.check_status()?;
        stats.loaded_from_server = true;

        let (prior_chain, mut seeds) = match prior {
            Some(prior) => (Some(prior.chain), prior.per_team_key_seeds),
            None => (None, Vec::new()),
        };

        let chain =
            sigchain::play_verified(prior_chain, &raw.chain, self.directory.as_ref()).await?;
        if chain.id() != team_id {
            return Err(ChainError::WrongTeam {
                seqno: 1,
                expected: team_id.clone(),
                got: chain.id().clone(),
            }
            .into());
        }

        let generation = raw.team_box.generation;
        if generation < chain.latest_generation() {
            warn!(
                team_id = %team_id,
                generation,
                latest = chain.latest_generation(),
                "Server sent a team box for an old generation"
            );
        }

        if !seeds.iter().any(|s| s.generation == generation) {
            self.keyring.sync().await?;
            let my_keys = self.keyring.secret_keys().await?;
            let item = open_team_box(&raw.team_box, &my_keys, &chain)?;

            seeds.retain(|s| s.generation != item.generation);
            seeds.push(item);
            seeds.sort_by_key(|s| s.generation);
        }

        let data = TeamData {
            chain,
            per_team_key_seeds: seeds,
            reader_key_masks: raw.reader_key_masks,
            loaded_at: Utc::now(),
        };

        self.storage.put(data.clone()).await;

        info!(
            team_id = %team_id,
            low_seqno,
            new_links = raw.chain.len(),
            last_seqno = data.chain.last_seqno(),
            generation = data.chain.latest_generation(),
            "Loaded team from server"
        );

        Ok(data)
    }
}

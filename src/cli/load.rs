//! Load command - runs the team loader against a saved server response

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use rand::RngCore;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::team::{TeamData, TeamId, TeamState};
use crate::infrastructure::crypto::HkdfDeviceKeyProvider;
use crate::infrastructure::identity::FileIdentityDirectory;
use crate::infrastructure::keyring::StaticKeyring;
use crate::infrastructure::loader::LoadTeamArg;
use crate::infrastructure::server::FileTeamServer;

#[derive(Args, Clone)]
pub struct LoadArgs {
    /// Saved team server response (JSON)
    #[arg(long)]
    pub response: PathBuf,

    /// Key histories of the chain's signers (JSON array)
    #[arg(long)]
    pub identities: PathBuf,

    /// Per-user encryption secret as `seqno:hex`; repeat for older keys
    #[arg(long = "per-user-key", required = true)]
    pub per_user_keys: Vec<String>,

    /// Device secret (hex, 32 bytes) protecting the disk cache
    #[arg(long, env = "TEAMCHAIN_DEVICE_SECRET")]
    pub device_secret: Option<String>,

    /// Team id to load
    #[arg(long, conflicts_with = "name")]
    pub team_id: Option<String>,

    /// Root team name to load
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub force_full_reload: bool,

    #[arg(long)]
    pub force_sync: bool,

    #[arg(long)]
    pub stale_ok: bool,

    #[arg(long)]
    pub no_network: bool,
}

/// What gets printed; secrets stay out of it
#[derive(Serialize)]
struct LoadSummary<'a> {
    chain: &'a TeamState,
    seed_generations: Vec<u32>,
    reader_key_masks: usize,
    loaded_at: DateTime<Utc>,
}

impl<'a> From<&'a TeamData> for LoadSummary<'a> {
    fn from(data: &'a TeamData) -> Self {
        Self {
            chain: &data.chain,
            seed_generations: data
                .per_team_key_seeds
                .iter()
                .map(|item| item.generation)
                .collect(),
            reader_key_masks: data.reader_key_masks.len(),
            loaded_at: data.loaded_at,
        }
    }
}

pub async fn run(args: LoadArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    super::init(&config);

    let arg = load_arg(&args)?;
    let device_secret = device_secret(args.device_secret.as_deref())?;

    if config.cache.data_dir.is_some() && args.device_secret.is_none() {
        warn!("No device secret given; the disk cache will not be readable next run");
    }

    let keyring = StaticKeyring::from_hex_pairs(args.per_user_keys.iter().map(String::as_str))?;
    let directory = FileIdentityDirectory::open(&args.identities).await?;
    let loader = crate::create_team_loader(
        &config,
        Arc::new(FileTeamServer::new(&args.response)),
        directory,
        Arc::new(keyring),
        Arc::new(HkdfDeviceKeyProvider::new(device_secret)),
    )
    .await?;

    let data = loader.load(&arg).await?;
    info!(
        team_id = %data.id(),
        last_seqno = data.chain.last_seqno(),
        "Team loaded"
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&LoadSummary::from(&data))?
    );

    Ok(())
}

fn load_arg(args: &LoadArgs) -> anyhow::Result<LoadTeamArg> {
    let mut arg = match (&args.team_id, &args.name) {
        (Some(id), _) => LoadTeamArg::by_id(TeamId::new(id.as_str())?),
        (None, Some(name)) => LoadTeamArg::by_name(name.as_str()),
        (None, None) => anyhow::bail!("one of --team-id or --name is required"),
    };

    if args.force_full_reload {
        arg = arg.force_full_reload();
    }
    if args.force_sync {
        arg = arg.force_sync();
    }
    if args.stale_ok {
        arg = arg.stale_ok();
    }
    if args.no_network {
        arg = arg.no_network();
    }

    Ok(arg)
}

fn device_secret(hex_secret: Option<&str>) -> anyhow::Result<[u8; 32]> {
    match hex_secret {
        Some(value) => hex::decode(value)
            .context("device secret is not hex")?
            .try_into()
            .map_err(|_| anyhow::anyhow!("device secret must be 32 bytes")),
        None => {
            let mut secret = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut secret);
            Ok(secret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        load: LoadArgs,
    }

    fn parse(args: &[&str]) -> LoadArgs {
        let mut argv = vec![
            "load",
            "--response",
            "team.json",
            "--identities",
            "users.json",
            "--per-user-key",
            "1:00",
        ];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).load
    }

    #[test]
    fn test_load_arg_by_name_with_flags() {
        let arg = load_arg(&parse(&["--name", "acme", "--stale-ok"])).unwrap();
        assert_eq!(arg, LoadTeamArg::by_name("acme").stale_ok());
    }

    #[test]
    fn test_load_arg_requires_target() {
        assert!(load_arg(&parse(&[])).is_err());
    }

    #[test]
    fn test_team_id_conflicts_with_name() {
        let result = TestCli::try_parse_from([
            "load",
            "--response",
            "team.json",
            "--identities",
            "users.json",
            "--per-user-key",
            "1:00",
            "--team-id",
            "abc",
            "--name",
            "acme",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_device_secret() {
        let hex_secret = "11".repeat(32);
        assert_eq!(device_secret(Some(&hex_secret)).unwrap(), [0x11; 32]);
        assert!(device_secret(Some("11")).is_err());
        assert!(device_secret(Some("zz")).is_err());
        assert_ne!(device_secret(None).unwrap(), device_secret(None).unwrap());
    }
}

//! Verify command - checks a chain file against its signers' keys and prints
//! the resulting team state

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::link::RawChainLink;
use crate::infrastructure::identity::FileIdentityDirectory;
use crate::infrastructure::sigchain;

#[derive(Args, Clone)]
pub struct VerifyArgs {
    /// JSON file holding an array of raw chain links
    pub file: PathBuf,

    /// Key histories of the chain's signers (JSON array)
    #[arg(long)]
    pub identities: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_default();
    super::init(&config);

    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let links: Vec<RawChainLink> =
        serde_json::from_str(&contents).context("parsing chain links")?;

    let directory = FileIdentityDirectory::open(&args.identities).await?;
    let state = sigchain::play_verified(None, &links, &directory).await?;
    info!(
        team_id = %state.id(),
        last_seqno = state.last_seqno(),
        "Chain verified"
    );

    let rendered = if args.compact {
        serde_json::to_string(&state)?
    } else {
        serde_json::to_string_pretty(&state)?
    };
    println!("{}", rendered);

    Ok(())
}

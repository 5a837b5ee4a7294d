use clap::Parser;
use teamchain::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify(args) => cli::verify::run(args).await,
        Command::TeamId(args) => cli::team_id::run(args).await,
        Command::Load(args) => cli::load::run(args).await,
    }
}

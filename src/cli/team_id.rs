//! Team ID command

use clap::Args;

use crate::domain::team::TeamName;

#[derive(Args, Clone)]
pub struct TeamIdArgs {
    /// Root team name
    pub name: String,
}

pub async fn run(args: TeamIdArgs) -> anyhow::Result<()> {
    let name = TeamName::parse(&args.name)?;
    println!("{}", name.to_team_id()?);
    Ok(())
}

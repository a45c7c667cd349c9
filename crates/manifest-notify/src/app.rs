use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};
use tokio::runtime::Builder;

use crate::cli::Cli;
use crate::config::{Config, Credentials};
use crate::git::GitCli;
use crate::logging;
use crate::message::Variant;
use crate::notifier::{compose, run};
use crate::space::SpaceClient;

/// Shared body of both entry points.
pub fn main_for(variant: Variant) -> Result<()> {
    let matches = Cli::command().name(variant.program_name()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    logging::init(cli.verbose);

    // One blocking run; nothing else to schedule alongside it.
    let rt = Builder::new_current_thread().enable_all().build()?;
    rt.block_on(execute(variant, cli))
}

pub async fn execute(variant: Variant, cli: Cli) -> Result<()> {
    let config = Config::load(cli.config)?;
    let commits = GitCli::new();

    if cli.dry_run {
        let body = compose(variant, &config, &commits).await?;
        println!("{body}");
        return Ok(());
    }

    let credentials = Credentials::from_env(&config)?;
    let chat = SpaceClient::with_service_account(credentials)?;
    run(variant, &config, &commits, &chat).await?;
    Ok(())
}

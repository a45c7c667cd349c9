use clap::Parser;
use std::path::PathBuf;

/// Post the "new nrf manifest" notification to the team chat channel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the notification instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Teamscast – Microsoft Teams webhook notifier
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a notification to one or more Teams webhooks
    Send {
        /// Ad-hoc webhook URL (falls back to TEAMS_WEBHOOK_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Named hook from teamscast.toml (repeatable)
        #[arg(long = "hook", value_name = "NAME")]
        hooks: Vec<String>,

        /// Send to every hook in the config
        #[arg(long, conflicts_with = "hooks")]
        all: bool,

        /// Prebuilt payload JSON file, "-" for stdin
        #[arg(short, long, value_name = "FILE")]
        payload: Option<PathBuf>,

        /// CI event JSON file to build an Adaptive Card from
        #[arg(long, value_name = "FILE", conflicts_with = "payload")]
        event: Option<PathBuf>,

        /// Event name shown on the card (e.g., push)
        #[arg(long, value_name = "NAME", default_value = "push")]
        event_name: String,

        /// Workflow name shown on the card
        #[arg(long, value_name = "NAME", default_value = "CI")]
        workflow: String,

        /// Limit concurrency (defaults to logical CPU cores)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },
    /// Print build information
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

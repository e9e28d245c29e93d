//! WhaleShield command line

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod config;
mod env_vars;
mod sub_commands;

use crate::config::Settings;

/// Private swaps routed through single-use identities
#[derive(Parser)]
#[command(name = "whaleshield")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh ephemeral address
    NewIdentity,
    /// Native balance of an address
    Balance(sub_commands::balance::BalanceSubCommand),
    /// Ask the aggregator for a quote
    Quote(sub_commands::quote::QuoteSubCommand),
    /// Run a full private swap against in-memory backends
    Simulate(sub_commands::simulate::SimulateSubCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();
    let default_filter = args.log_level;

    let http_filter = "hyper=warn,reqwest=warn,rustls=warn";

    let env_filter = EnvFilter::new(format!("{default_filter},{http_filter}"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = Settings::new(args.config.clone()).from_env();

    match &args.command {
        Commands::NewIdentity => sub_commands::new_identity::new_identity(),
        Commands::Balance(sub_command_args) => {
            sub_commands::balance::balance(&settings, sub_command_args).await
        }
        Commands::Quote(sub_command_args) => {
            sub_commands::quote::quote(&settings, sub_command_args).await
        }
        Commands::Simulate(sub_command_args) => {
            sub_commands::simulate::simulate(&settings, sub_command_args).await
        }
    }
}

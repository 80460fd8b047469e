//! docproof CLI
//!
//! Anchor document digests on a public ledger, verify them later and diagnose
//! misconfigured wallets or contracts.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{anchor::AnchorArgs, verify::VerifyArgs, Handlers};
use config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "docproof")]
#[command(
    about = "docproof - ledger anchoring and verification for document digests",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "docproof.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Anchor a document's digest and wait for confirmation
    Anchor(AnchorArgs),

    /// Check whether a document's digest is anchored
    Verify(VerifyArgs),

    /// Probe wallet network and contract deployment, printing JSON
    Diagnose,

    /// List networks that can be registered automatically
    Networks {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so stdout stays JSON
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Anchor(args) => {
            let config = config::load_config(&cli.config, &cli.overrides)?;
            let handlers =
                Handlers::from_config(&config).map_err(|e| commands::operator_error(&e))?;
            commands::anchor::run(args, handlers).await?;
        }

        Commands::Verify(args) => {
            let config = config::load_config(&cli.config, &cli.overrides)?;
            let handlers =
                Handlers::from_config(&config).map_err(|e| commands::operator_error(&e))?;
            commands::verify::run(args, handlers).await?;
        }

        Commands::Diagnose => {
            let config = config::load_config(&cli.config, &cli.overrides)?;
            commands::diagnose::run(&config).await?;
        }

        Commands::Networks { json } => {
            commands::networks::run(json)?;
        }
    }

    Ok(())
}

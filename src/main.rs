// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! EnsGate CLI application

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "ensgate")]
#[command(about = "CCIP-Read offchain gateway for ENS wildcard subdomains", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Gateway HTTP server
    Server {
        #[command(subcommand)]
        command: cli::server::ServerCommands,
    },
    /// Signing key management
    Keys {
        #[command(subcommand)]
        command: cli::keys::KeysCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Without -v: only WARN and ERROR. With -v: INFO as well.
    // RUST_LOG overrides everything.
    if std::env::var("RUST_LOG").is_err() {
        use tracing_subscriber::EnvFilter;

        let filter = if cli.verbose {
            EnvFilter::new("ensgate=info")
        } else {
            EnvFilter::new("ensgate=warn")
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_target(true)
            .init();
    }

    match cli.command {
        Commands::Server { command } => {
            cli::server::execute(command).await?;
        }
        Commands::Keys { command } => {
            cli::keys::execute(command).await?;
        }
    }

    Ok(())
}

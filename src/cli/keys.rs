// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Signing key management commands

use anyhow::{Context, Result};
use clap::Subcommand;
use ensgate::crypto::keypair::{get_key_dir, save_signer, GatewaySigner};

#[derive(Subcommand)]
pub enum KeysCommands {
    /// Generate a new gateway signing key and store it locally
    Generate {
        /// Overwrite an existing stored key
        #[arg(long)]
        force: bool,
    },
    /// Show the stored signer address
    Show,
}

pub async fn execute(command: KeysCommands) -> Result<()> {
    match command {
        KeysCommands::Generate { force } => generate_command(force),
        KeysCommands::Show => show_command(),
    }
}

fn generate_command(force: bool) -> Result<()> {
    let key_file = get_key_dir()?.join("gateway-key.txt");
    if key_file.exists() && !force {
        anyhow::bail!(
            "A gateway key already exists at {} (use --force to overwrite)",
            key_file.display()
        );
    }

    let signer = GatewaySigner::generate();
    let path = save_signer(&signer).context("Failed to store gateway key")?;

    println!("Generated gateway signing key");
    println!("  Address: {}", signer.address());
    println!("  Stored:  {}", path.display());
    println!("\nConfigure the on-chain verifier with this signer address.");

    Ok(())
}

fn show_command() -> Result<()> {
    let signer = ensgate::crypto::load_signer()?;
    println!("Gateway signer: {}", signer.address());
    Ok(())
}

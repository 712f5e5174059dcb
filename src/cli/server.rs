// Copyright 2025 EnsGate Contributors
// Licensed under GPL-3.0

//! Gateway server commands

use anyhow::{Context, Result};
use clap::Subcommand;
use ensgate::constants::{AUDIT_LOG_FILE, DEFAULT_TTL_SECS, GATEWAY_PORT};
use ensgate::record::MemoryStore;
use ensgate::server::{AppState, AuditLog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;

#[derive(Subcommand)]
pub enum ServerCommands {
    /// Start the gateway
    Start {
        /// HTTP port
        #[arg(long, default_value_t = GATEWAY_PORT)]
        port: u16,
        /// Signature validity window in seconds
        #[arg(long, default_value_t = DEFAULT_TTL_SECS)]
        ttl: u64,
        /// Audit log file path
        #[arg(long, default_value = AUDIT_LOG_FILE)]
        log_file: PathBuf,
    },
    /// Show gateway status
    Status {
        /// HTTP port to probe
        #[arg(long, default_value_t = GATEWAY_PORT)]
        port: u16,
    },
}

pub async fn execute(command: ServerCommands) -> Result<()> {
    match command {
        ServerCommands::Start {
            port,
            ttl,
            log_file,
        } => start_command(port, ttl, log_file).await,
        ServerCommands::Status { port } => status_command(port),
    }
}

async fn start_command(port: u16, ttl: u64, log_file: PathBuf) -> Result<()> {
    let signer = ensgate::crypto::load_signer().context("Failed to load gateway signing key")?;

    println!("{}", "=".repeat(60));
    println!("  CCIP-Read Gateway");
    println!("{}", "=".repeat(60));
    println!("  Port:    {}", port);
    println!("  Signer:  {}", signer.address());
    println!("  Log:     {}", log_file.display());
    println!("{}", "=".repeat(60));
    println!("\nEndpoints:");
    println!("  GET  http://localhost:{}/health", port);
    println!("  GET  http://localhost:{}/subdomains", port);
    println!("  POST http://localhost:{}/register", port);
    println!("  POST http://localhost:{}/setText", port);
    println!("  GET  http://localhost:{}/direct/getEntitiesList", port);
    println!("  GET  http://localhost:{}/direct/getRecord", port);
    println!("  GET  http://localhost:{}/:sender/:callData.json  (CCIP-Read)", port);
    println!("  POST http://localhost:{}/rpc                     (CCIP-Read)\n", port);

    let state = Arc::new(AppState {
        store: Mutex::new(MemoryStore::new()),
        signer,
        audit: AuditLog::new(log_file),
        ttl_secs: ttl,
        started: SystemTime::now(),
    });

    tokio::select! {
        result = ensgate::server::run(port, state) => {
            eprintln!("Gateway exited: {:?}", result);
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down gateway...");
        }
    }

    Ok(())
}

fn status_command(port: u16) -> Result<()> {
    use std::net::TcpListener;

    println!("EnsGate Status\n");

    // If the port refuses a bind, something is listening there
    let running = TcpListener::bind(("127.0.0.1", port)).is_err();
    if running {
        println!("  Gateway (port {}): ✓ Running", port);
    } else {
        println!("  Gateway (port {}): ✗ Not running", port);
        println!("\nStart it with: ensgate server start");
    }

    match ensgate::crypto::load_signer() {
        Ok(signer) => println!("  Signer: {}", signer.address()),
        Err(_) => println!("  Signer: ✗ No key configured (run 'ensgate keys generate')"),
    }

    Ok(())
}

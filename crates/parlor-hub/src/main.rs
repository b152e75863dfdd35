//! # parlor-hub
//!
//! Parlor chat hub server binary — wires the identity collaborators to the
//! WebSocket server and runs until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use parlor_auth::{IdentityBinder, MemoryAccounts};
use parlor_server::config::ServerConfig;
use parlor_server::server::ParlorServer;
use parlor_settings::ParlorSettings;

/// Parlor chat hub server.
#[derive(Parser, Debug)]
#[command(name = "parlor-hub", about = "Parlor chat hub server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (defaults to `~/.parlor/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Path to a JSON accounts seed file for the in-memory account store.
    #[arg(long)]
    accounts: Option<PathBuf>,
}

fn init_logging(settings: &ParlorSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .unwrap_or_else(parlor_settings::settings_path);
    let settings = parlor_settings::load_settings_from_path(&settings_path)
        .context("failed to load settings")?;

    init_logging(&settings);

    // Identity collaborators. The in-memory store stands in for the
    // external login/profile services; a seed file populates it.
    let accounts = match args.accounts {
        Some(path) => parlor_auth::storage::load_accounts(&path).unwrap_or_else(|| {
            tracing::warn!("starting with an empty account store");
            MemoryAccounts::new()
        }),
        None => {
            tracing::warn!("no --accounts file given; every connection will be rejected");
            MemoryAccounts::new()
        }
    };
    let accounts = Arc::new(accounts);
    let binder = IdentityBinder::new(accounts.clone(), accounts);

    let mut config = ServerConfig::from_settings(&settings);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let server = ParlorServer::new(config, binder);
    let (addr, serve_handle) = server.listen().await.context("failed to bind server")?;
    tracing::info!("parlor hub listening on ws://{addr}/ws");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    tracing::info!("shutting down...");
    server
        .shutdown()
        .graceful_shutdown(server.registry(), Some(Duration::from_secs(10)))
        .await;
    let _ = serve_handle.await;

    tracing::info!("shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

// ABOUTME: Server binary for the bicycle rental REST API
// ABOUTME: Wires configuration, database, auth and the HTTP serve loop together
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Velo Rental Server Binary
//!
//! Starts the rental API: loads environment configuration, opens the
//! database, and serves the versioned REST surface until shutdown.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use velo_rental::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    logging,
    server::{self, ServerResources},
};

#[derive(Parser)]
#[command(name = "velo-rental-server")]
#[command(about = "Bicycle rental REST API")]
pub struct Args {
    /// Override the bind address (otherwise taken from ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// Override the database URL (otherwise taken from DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    logging::init_from_env()?;
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!(database_url = %config.database_url, "database ready");

    let auth = AuthManager::new(config.jwt_secret.as_bytes(), config.token_expiry_days);
    let resources = Arc::new(ServerResources::new(database, auth, config));

    server::run(resources).await
}

// ABOUTME: HTTP server assembly: shared resources, router construction and serve loop
// ABOUTME: Mounts the versioned API, tracing and CORS layers over axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::routes::{
    admin::AdminRoutes, auth::AuthRoutes, bikes::BikeRoutes, health::HealthRoutes,
    rentals::RentalRoutes, users::UserRoutes,
};

/// Shared state handed to every route handler.
pub struct ServerResources {
    /// Database handle.
    pub database: Database,
    /// Token signer/validator.
    pub auth: AuthManager,
    /// Resolved configuration.
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's long-lived components.
    #[must_use]
    pub fn new(database: Database, auth: AuthManager, config: ServerConfig) -> Self {
        Self {
            database,
            auth,
            config,
        }
    }
}

/// Build the full application router.
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(UserRoutes::routes(resources.clone()))
        .merge(BikeRoutes::routes(resources.clone()))
        .merge(RentalRoutes::routes(resources.clone()))
        .merge(AdminRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the configured address and serve until shutdown.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server faults.
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr = resources.config.addr.clone();
    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
    }
    info!("shutdown signal received");
}

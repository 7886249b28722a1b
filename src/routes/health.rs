// ABOUTME: Service status endpoint
// ABOUTME: Reports version and database reachability

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;

use crate::errors::AppError;
use crate::server::ServerResources;

use super::success;

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the status route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/status", get(Self::handle_status))
            .with_state(resources)
    }

    /// Handle GET /status
    async fn handle_status(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let database_ok = sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await
            .is_ok();
        Ok(success(
            "service status",
            json!({
                "version": env!("CARGO_PKG_VERSION"),
                "database": if database_ok { "up" } else { "down" },
            }),
        ))
    }
}

// ABOUTME: Rider-facing bike endpoints
// ABOUTME: Lists bikes currently available for rental

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::errors::AppError;
use crate::server::ServerResources;

use super::{authenticate_user, keyed, success};

/// Bike routes handler
pub struct BikeRoutes;

impl BikeRoutes {
    /// Create all rider-facing bike routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/bikes/available", get(Self::handle_list_available))
            .with_state(resources)
    }

    /// Handle GET /bikes/available - bikes that can be rented right now
    async fn handle_list_available(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        authenticate_user(&headers, &resources).await?;
        let bikes = resources
            .database
            .get_available_bikes()
            .await
            .map_err(|e| AppError::database(format!("failed to list bikes: {e}")))?;
        Ok(success("available bikes", keyed("bikes", &bikes)))
    }
}

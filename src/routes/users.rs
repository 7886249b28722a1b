// ABOUTME: Rider profile endpoints
// ABOUTME: Lets an authenticated user read and update their own account

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::errors::AppError;
use crate::server::ServerResources;

use super::{authenticate_user, keyed, success};

/// Profile update body; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
}

/// Profile routes handler
pub struct UserRoutes;

impl UserRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/users/profile", get(Self::handle_get_profile))
            .route("/users/profile", patch(Self::handle_update_profile))
            .with_state(resources)
    }

    /// Handle GET /users/profile - return the authenticated user
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = authenticate_user(&headers, &resources).await?;
        Ok(success("profile", keyed("user", &user)))
    }

    /// Handle PATCH /users/profile - partial profile update
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<UpdateProfileBody>,
    ) -> Result<Response, AppError> {
        let user = authenticate_user(&headers, &resources).await?;

        let email = body.email.unwrap_or_else(|| user.email.clone());
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::invalid_input("a valid email is required"));
        }
        let first_name = body.first_name.unwrap_or_else(|| user.first_name.clone());
        let last_name = body.last_name.unwrap_or_else(|| user.last_name.clone());
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::invalid_input("first and last name are required"));
        }

        resources
            .database
            .update_user(user.id, &email, &first_name, &last_name)
            .await
            .map_err(|e| AppError::database(format!("failed to update profile: {e}")))?;

        let updated = resources
            .database
            .get_user(user.id)
            .await
            .map_err(|e| AppError::database(format!("failed to reload user: {e}")))?
            .ok_or_else(|| AppError::internal("updated user vanished"))?;

        Ok(success("profile updated", keyed("user", &updated)))
    }
}

// ABOUTME: Registration and login endpoints
// ABOUTME: Issues session tokens after bcrypt credential verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{hash_password, verify_password};
use crate::errors::AppError;
use crate::server::ServerResources;

use super::{success, success_with_status};

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl RegisterBody {
    /// Reject implausible registrations before touching the database.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(AppError::invalid_input("a valid email is required"));
        }
        if self.password.len() < 8 {
            return Err(AppError::invalid_input(
                "password must be at least 8 characters",
            ));
        }
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(AppError::invalid_input("first and last name are required"));
        }
        Ok(())
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Serialize)]
pub struct TokenData {
    /// Signed bearer token.
    pub token: String,
}

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::handle_register))
            .route("/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle POST /auth/register - create a new rider account
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<RegisterBody>,
    ) -> Result<Response, AppError> {
        body.validate()?;

        let existing = resources
            .database
            .get_user_by_email(&body.email)
            .await
            .map_err(|e| AppError::database(format!("failed to check email: {e}")))?;
        if existing.is_some() {
            return Err(AppError::already_exists("an account with this email"));
        }

        let hashed = hash_password(&body.password)?;
        let user = resources
            .database
            .create_user(&body.email, &hashed, &body.first_name, &body.last_name)
            .await
            .map_err(|e| AppError::database(format!("failed to create user: {e}")))?;

        tracing::info!(user_id = user.id, "registered new user");
        Ok(success_with_status(
            StatusCode::CREATED,
            "user registered",
            json!({ "user": user }),
        ))
    }

    /// Handle POST /auth/login - verify credentials and issue a token
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<LoginBody>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .get_user_by_email(&body.email)
            .await
            .map_err(|e| AppError::database(format!("failed to load user: {e}")))?
            .ok_or_else(|| AppError::auth_invalid("invalid email or password"))?;

        if !verify_password(&body.password, &user.hashed_password)? {
            return Err(AppError::auth_invalid("invalid email or password"));
        }

        let token = resources.auth.generate_token(&user)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(success("login successful", TokenData { token }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(email: &str, password: &str) -> RegisterBody {
        RegisterBody {
            email: email.into(),
            password: password.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[test]
    fn registration_requires_plausible_email() {
        assert!(body("rider@example.com", "longenough").validate().is_ok());
        assert!(body("not-an-email", "longenough").validate().is_err());
        assert!(body("", "longenough").validate().is_err());
    }

    #[test]
    fn registration_requires_minimum_password_length() {
        assert!(body("rider@example.com", "short").validate().is_err());
    }
}

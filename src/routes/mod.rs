// ABOUTME: REST route modules and the shared response envelope
// ABOUTME: Groups auth, profile, bike, rental, admin and health endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # REST Routes
//!
//! Every endpoint responds with the same envelope: `status` is `success`,
//! `fail` (client error) or `error` (server error), `message` is
//! human-readable, and `data` carries the payload when there is one.

pub mod admin;
pub mod auth;
pub mod bikes;
pub mod health;
pub mod rentals;
pub mod users;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::auth::bearer_token;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::server::ServerResources;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `success` for this type.
    pub status: &'static str,
    /// Human-readable summary.
    pub message: String,
    /// Payload, omitted when there is none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Build a `200 OK` success envelope with a payload.
pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    success_with_status(StatusCode::OK, message, data)
}

/// Build a success envelope with an explicit status code.
pub fn success_with_status<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> Response {
    let body = ApiResponse {
        status: "success",
        message: message.into(),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

/// Build a success envelope with no payload.
pub fn success_empty(message: impl Into<String>) -> Response {
    let body = ApiResponse::<serde_json::Value> {
        status: "success",
        message: message.into(),
        data: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Authenticate a rider from the Authorization header and load their
/// account. Soft-deleted accounts are treated as unknown.
pub(crate) async fn authenticate_user(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<User> {
    let header_value = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(AppError::auth_required)?;
    let token = bearer_token(header_value)?;
    let user_id = resources.auth.extract_user_id(token)?;

    let user = resources
        .database
        .get_user(user_id)
        .await
        .map_err(|e| AppError::database(format!("failed to load user {user_id}: {e}")))?
        .ok_or_else(|| AppError::auth_invalid("unknown user"))?;
    if user.deleted {
        return Err(AppError::auth_invalid("unknown user"));
    }
    Ok(user)
}

/// Serialize a model into the `data` object under a single key, matching
/// the envelope's `{"data": {"user": ...}}` shape.
pub(crate) fn keyed<T: Serialize>(key: &str, value: &T) -> serde_json::Value {
    json!({ key: value })
}

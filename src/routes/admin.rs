// ABOUTME: Admin endpoints for fleet, account and rental oversight
// ABOUTME: Protected by HTTP Basic auth checked in constant time
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::config::AdminCredentials;
use crate::errors::AppError;
use crate::models::RentalStatus;
use crate::server::ServerResources;

use super::{keyed, success, success_empty, success_with_status};

/// Body for adding a bike to the fleet.
#[derive(Debug, Deserialize)]
pub struct CreateBikeBody {
    /// Initial latitude in degrees.
    pub latitude: f64,
    /// Initial longitude in degrees.
    pub longitude: f64,
    /// Price per whole minute.
    pub cost_per_minute: f64,
}

impl CreateBikeBody {
    /// Reject out-of-range coordinates and negative pricing.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_position(self.latitude, self.longitude)?;
        if self.cost_per_minute < 0.0 {
            return Err(AppError::invalid_input(
                "cost_per_minute must not be negative",
            ));
        }
        Ok(())
    }
}

/// Body for updating a bike; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateBikeBody {
    /// New availability flag.
    pub is_available: Option<bool>,
    /// New latitude.
    pub latitude: Option<f64>,
    /// New longitude.
    pub longitude: Option<f64>,
    /// New price per minute.
    pub cost_per_minute: Option<f64>,
}

/// Body for updating any user's profile; absent fields keep their current
/// value.
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    /// New email address.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
}

/// Body for correcting a rental's record; absent fields keep their current
/// value.
#[derive(Debug, Deserialize)]
pub struct UpdateRentalBody {
    /// Reassign the renting user.
    pub user_id: Option<i64>,
    /// Reassign the rented bike.
    pub bike_id: Option<i64>,
    /// New lifecycle state.
    pub rental_status: Option<RentalStatus>,
    /// New start time.
    pub start_time: Option<DateTime<Utc>>,
    /// New end time.
    pub end_time: Option<DateTime<Utc>>,
    /// New start latitude.
    pub start_latitude: Option<f64>,
    /// New start longitude.
    pub start_longitude: Option<f64>,
    /// New end latitude.
    pub end_latitude: Option<f64>,
    /// New end longitude.
    pub end_longitude: Option<f64>,
    /// New whole-minute duration.
    #[serde(rename = "duration")]
    pub duration_minutes: Option<i64>,
    /// New total cost.
    pub cost: Option<f64>,
}

/// Admin routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/admin/bikes", get(Self::handle_list_bikes))
            .route("/admin/bikes", post(Self::handle_create_bike))
            .route("/admin/bikes/:id", get(Self::handle_get_bike))
            .route("/admin/bikes/:id", patch(Self::handle_update_bike))
            .route("/admin/bikes/:id", delete(Self::handle_delete_bike))
            .route("/admin/users", get(Self::handle_list_users))
            .route("/admin/users/:id", get(Self::handle_get_user))
            .route("/admin/users/:id", patch(Self::handle_update_user))
            .route("/admin/users/:id", delete(Self::handle_delete_user))
            .route("/admin/rentals", get(Self::handle_list_rentals))
            .route("/admin/rentals/:id", get(Self::handle_get_rental))
            .route("/admin/rentals/:id", patch(Self::handle_update_rental))
            .with_state(resources)
    }

    /// Check HTTP Basic credentials against the configured admin account.
    fn authorize(headers: &HeaderMap, credentials: &AdminCredentials) -> Result<(), AppError> {
        let header_value = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;
        let encoded = header_value
            .strip_prefix("Basic ")
            .ok_or_else(|| AppError::auth_invalid("expected Basic authorization"))?;
        let decoded = BASE64
            .decode(encoded)
            .map_err(|_| AppError::auth_invalid("malformed Basic credentials"))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AppError::auth_invalid("malformed Basic credentials"))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AppError::auth_invalid("malformed Basic credentials"))?;

        // Constant-time comparison; both fields are always checked.
        let username_ok = username.as_bytes().ct_eq(credentials.username.as_bytes());
        let password_ok = password.as_bytes().ct_eq(credentials.password.as_bytes());
        if bool::from(username_ok & password_ok) {
            Ok(())
        } else {
            Err(AppError::permission_denied("invalid admin credentials"))
        }
    }

    /// Handle GET /admin/bikes - the whole fleet
    async fn handle_list_bikes(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let bikes = resources
            .database
            .get_bikes()
            .await
            .map_err(|e| AppError::database(format!("failed to list bikes: {e}")))?;
        Ok(success("bikes", keyed("bikes", &bikes)))
    }

    /// Handle POST /admin/bikes - add a bike to the fleet
    async fn handle_create_bike(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateBikeBody>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        body.validate()?;

        let bike = resources
            .database
            .create_bike(body.latitude, body.longitude, body.cost_per_minute)
            .await
            .map_err(|e| AppError::database(format!("failed to create bike: {e}")))?;

        tracing::info!(bike_id = bike.id, "bike added to fleet");
        Ok(success_with_status(
            StatusCode::CREATED,
            "bike created",
            keyed("bike", &bike),
        ))
    }

    /// Handle GET /admin/bikes/:id
    async fn handle_get_bike(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bike_id): Path<i64>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let bike = resources
            .database
            .get_bike(bike_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load bike: {e}")))?
            .ok_or_else(|| AppError::not_found("bike"))?;
        Ok(success("bike", keyed("bike", &bike)))
    }

    /// Handle PATCH /admin/bikes/:id - partial bike update
    async fn handle_update_bike(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bike_id): Path<i64>,
        Json(body): Json<UpdateBikeBody>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let bike = resources
            .database
            .get_bike(bike_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load bike: {e}")))?
            .ok_or_else(|| AppError::not_found("bike"))?;

        let latitude = body.latitude.unwrap_or(bike.latitude);
        let longitude = body.longitude.unwrap_or(bike.longitude);
        validate_position(latitude, longitude)?;
        let cost_per_minute = body.cost_per_minute.unwrap_or(bike.cost_per_minute);
        if cost_per_minute < 0.0 {
            return Err(AppError::invalid_input("cost_per_minute must not be negative"));
        }
        let is_available = body.is_available.unwrap_or(bike.is_available);

        resources
            .database
            .update_bike(bike.id, is_available, latitude, longitude, cost_per_minute)
            .await
            .map_err(|e| AppError::database(format!("failed to update bike: {e}")))?;

        let updated = resources
            .database
            .get_bike(bike.id)
            .await
            .map_err(|e| AppError::database(format!("failed to reload bike: {e}")))?
            .ok_or_else(|| AppError::internal("updated bike vanished"))?;
        Ok(success("bike updated", keyed("bike", &updated)))
    }

    /// Handle DELETE /admin/bikes/:id
    async fn handle_delete_bike(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bike_id): Path<i64>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let removed = resources
            .database
            .delete_bike(bike_id)
            .await
            .map_err(|e| AppError::database(format!("failed to delete bike: {e}")))?;
        if !removed {
            return Err(AppError::not_found("bike"));
        }
        tracing::info!(bike_id, "bike removed from fleet");
        Ok(success_empty("bike deleted"))
    }

    /// Handle GET /admin/users - every account, including deleted ones
    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let users = resources
            .database
            .get_users()
            .await
            .map_err(|e| AppError::database(format!("failed to list users: {e}")))?;
        Ok(success("users", keyed("users", &users)))
    }

    /// Handle GET /admin/users/:id
    async fn handle_get_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<i64>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let user = resources
            .database
            .get_user(user_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load user: {e}")))?
            .ok_or_else(|| AppError::not_found("user"))?;
        Ok(success("user", keyed("user", &user)))
    }

    /// Handle PATCH /admin/users/:id - partial profile update by id
    async fn handle_update_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<i64>,
        Json(body): Json<UpdateUserBody>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let user = resources
            .database
            .get_user(user_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load user: {e}")))?
            .ok_or_else(|| AppError::not_found("user"))?;

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
            .map_err(|e| AppError::database(format!("failed to update user: {e}")))?;

        let updated = resources
            .database
            .get_user(user.id)
            .await
            .map_err(|e| AppError::database(format!("failed to reload user: {e}")))?
            .ok_or_else(|| AppError::internal("updated user vanished"))?;
        Ok(success("user updated", keyed("user", &updated)))
    }

    /// Handle DELETE /admin/users/:id - soft delete
    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<i64>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let removed = resources
            .database
            .delete_user(user_id)
            .await
            .map_err(|e| AppError::database(format!("failed to delete user: {e}")))?;
        if !removed {
            return Err(AppError::not_found("user"));
        }
        tracing::info!(user_id, "user soft-deleted");
        Ok(success_empty("user deleted"))
    }

    /// Handle GET /admin/rentals - every rental across all users
    async fn handle_list_rentals(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let rentals = resources
            .database
            .get_rentals()
            .await
            .map_err(|e| AppError::database(format!("failed to list rentals: {e}")))?;
        Ok(success("rentals", keyed("rentals", &rentals)))
    }

    /// Handle GET /admin/rentals/:id
    async fn handle_get_rental(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(rental_id): Path<i64>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let rental = resources
            .database
            .get_rental(rental_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load rental: {e}")))?
            .ok_or_else(|| AppError::not_found("rental"))?;
        Ok(success("rental", keyed("rental", &rental)))
    }

    /// Handle PATCH /admin/rentals/:id - correct a rental's record
    async fn handle_update_rental(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(rental_id): Path<i64>,
        Json(body): Json<UpdateRentalBody>,
    ) -> Result<Response, AppError> {
        Self::authorize(&headers, &resources.config.admin)?;
        let mut rental = resources
            .database
            .get_rental(rental_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load rental: {e}")))?
            .ok_or_else(|| AppError::not_found("rental"))?;

        if let Some(user_id) = body.user_id {
            rental.user_id = user_id;
        }
        if let Some(bike_id) = body.bike_id {
            rental.bike_id = bike_id;
        }
        if let Some(rental_status) = body.rental_status {
            rental.rental_status = rental_status;
        }
        if let Some(start_time) = body.start_time {
            rental.start_time = start_time;
        }
        if let Some(end_time) = body.end_time {
            rental.end_time = Some(end_time);
        }
        if let Some(start_latitude) = body.start_latitude {
            rental.start_latitude = start_latitude;
        }
        if let Some(start_longitude) = body.start_longitude {
            rental.start_longitude = start_longitude;
        }
        if let Some(end_latitude) = body.end_latitude {
            rental.end_latitude = Some(end_latitude);
        }
        if let Some(end_longitude) = body.end_longitude {
            rental.end_longitude = Some(end_longitude);
        }
        if let Some(duration_minutes) = body.duration_minutes {
            if duration_minutes < 0 {
                return Err(AppError::invalid_input("duration must not be negative"));
            }
            rental.duration_minutes = Some(duration_minutes);
        }
        if let Some(cost) = body.cost {
            if cost < 0.0 {
                return Err(AppError::invalid_input("cost must not be negative"));
            }
            rental.cost = Some(cost);
        }
        validate_position(rental.start_latitude, rental.start_longitude)?;

        resources
            .database
            .update_rental(&rental)
            .await
            .map_err(|e| AppError::database(format!("failed to update rental: {e}")))?;

        let updated = resources
            .database
            .get_rental(rental.id)
            .await
            .map_err(|e| AppError::database(format!("failed to reload rental: {e}")))?
            .ok_or_else(|| AppError::internal("updated rental vanished"))?;
        Ok(success("rental updated", keyed("rental", &updated)))
    }
}

fn validate_position(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::invalid_input("latitude must be within [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::invalid_input(
            "longitude must be within [-180, 180]",
        ));
    }
    Ok(())
}

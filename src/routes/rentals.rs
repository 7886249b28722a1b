// ABOUTME: Rental lifecycle endpoints
// ABOUTME: Starts rides, closes them out with duration and cost, and serves history
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rental routes
//!
//! A rider can have at most one running rental. Starting a ride claims an
//! available bike; ending it computes the whole-minute duration and cost,
//! drops the bike at a jittered position near the start, and releases it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::geo::{random_nearby, Coordinates};
use crate::models::Rental;
use crate::server::ServerResources;

use super::{authenticate_user, keyed, success};

/// How far from its start position a bike may be dropped off, in km.
const DROPOFF_RADIUS_KM: f64 = 5.0;

/// Body for starting and ending a rental.
#[derive(Debug, Deserialize)]
pub struct RentalBody {
    /// The bike being rented or returned.
    pub bike_id: i64,
}

/// Rental routes handler
pub struct RentalRoutes;

impl RentalRoutes {
    /// Create all rental routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/rentals/start", post(Self::handle_start))
            .route("/rentals/end", post(Self::handle_end))
            .route("/rentals/history", get(Self::handle_history))
            .with_state(resources)
    }

    /// Handle POST /rentals/start - claim an available bike
    async fn handle_start(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<RentalBody>,
    ) -> Result<Response, AppError> {
        let user = authenticate_user(&headers, &resources).await?;

        let running = resources
            .database
            .get_running_rental(user.id)
            .await
            .map_err(|e| AppError::database(format!("failed to check running rental: {e}")))?;
        if running.is_some() {
            return Err(AppError::invalid_input("you already have a running rental"));
        }

        let bike = resources
            .database
            .get_bike(body.bike_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load bike: {e}")))?
            .ok_or_else(|| AppError::not_found("bike"))?;
        if !bike.is_available {
            return Err(AppError::unavailable("bike is not available"));
        }

        resources
            .database
            .set_bike_availability(bike.id, false)
            .await
            .map_err(|e| AppError::database(format!("failed to claim bike: {e}")))?;

        let rental = resources
            .database
            .create_rental(user.id, bike.id, Utc::now(), bike.latitude, bike.longitude)
            .await
            .map_err(|e| AppError::database(format!("failed to create rental: {e}")))?;

        tracing::info!(user_id = user.id, bike_id = bike.id, rental_id = rental.id, "rental started");
        Ok(success("rental started", keyed("rental", &rental)))
    }

    /// Handle POST /rentals/end - close out the running rental
    async fn handle_end(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<RentalBody>,
    ) -> Result<Response, AppError> {
        let user = authenticate_user(&headers, &resources).await?;

        let rental = resources
            .database
            .get_running_rental(user.id)
            .await
            .map_err(|e| AppError::database(format!("failed to load running rental: {e}")))?
            .ok_or_else(|| AppError::not_found("running rental"))?;
        if rental.bike_id != body.bike_id {
            return Err(AppError::invalid_input(
                "bike does not match the running rental",
            ));
        }

        let bike = resources
            .database
            .get_bike(rental.bike_id)
            .await
            .map_err(|e| AppError::database(format!("failed to load bike: {e}")))?
            .ok_or_else(|| AppError::not_found("bike"))?;

        let end_time = Utc::now();
        let (duration_minutes, cost) =
            compute_charges(rental.start_time, end_time, bike.cost_per_minute);
        let dropoff = random_nearby(
            Coordinates {
                latitude: rental.start_latitude,
                longitude: rental.start_longitude,
            },
            DROPOFF_RADIUS_KM,
        );

        resources
            .database
            .end_rental(
                rental.id,
                end_time,
                dropoff.latitude,
                dropoff.longitude,
                duration_minutes,
                cost,
            )
            .await
            .map_err(|e| AppError::database(format!("failed to end rental: {e}")))?;

        // Bike is released at the drop-off point.
        resources
            .database
            .update_bike(
                bike.id,
                true,
                dropoff.latitude,
                dropoff.longitude,
                bike.cost_per_minute,
            )
            .await
            .map_err(|e| AppError::database(format!("failed to release bike: {e}")))?;

        let ended = resources
            .database
            .get_rental(rental.id)
            .await
            .map_err(|e| AppError::database(format!("failed to reload rental: {e}")))?
            .ok_or_else(|| AppError::internal("ended rental vanished"))?;

        tracing::info!(
            user_id = user.id,
            rental_id = ended.id,
            duration_minutes,
            cost,
            "rental ended"
        );
        Ok(success("rental ended", keyed("rental", &ended)))
    }

    /// Handle GET /rentals/history - the rider's rentals, newest first
    async fn handle_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = authenticate_user(&headers, &resources).await?;
        let rentals: Vec<Rental> = resources
            .database
            .get_rentals_for_user(user.id)
            .await
            .map_err(|e| AppError::database(format!("failed to list rentals: {e}")))?;
        Ok(success("rental history", keyed("rentals", &rentals)))
    }
}

/// Whole-minute duration and resulting cost for a ride. Partial minutes are
/// not billed.
fn compute_charges(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    cost_per_minute: f64,
) -> (i64, f64) {
    let duration_minutes = (end - start).num_minutes().max(0);
    #[allow(clippy::cast_precision_loss)]
    let cost = duration_minutes as f64 * cost_per_minute;
    (duration_minutes, cost)
}

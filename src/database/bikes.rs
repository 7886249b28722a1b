// ABOUTME: Bike fleet database operations
// ABOUTME: Handles fleet CRUD, availability listing and position updates

use anyhow::{Context, Result};
use chrono::Utc;

use super::mapper::{format_timestamp, SqlParam};
use super::Database;
use crate::models::Bike;

impl Database {
    pub(super) async fn migrate_bikes(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bikes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                is_available BOOLEAN NOT NULL DEFAULT 1,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                cost_per_minute REAL NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bikes_available ON bikes(is_available)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Add a bike to the fleet and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_bike(
        &self,
        latitude: f64,
        longitude: f64,
        cost_per_minute: f64,
    ) -> Result<Bike> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r"
            INSERT INTO bikes (is_available, latitude, longitude, cost_per_minute, created_at, updated_at)
            VALUES (1, $1, $2, $3, $4, $5)
            ",
        )
        .bind(latitude)
        .bind(longitude)
        .bind(cost_per_minute)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("failed to insert bike")?;

        self.get_bike(result.last_insert_rowid())
            .await?
            .context("inserted bike not found")
    }

    /// Look up a bike by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_bike(&self, bike_id: i64) -> Result<Option<Bike>> {
        let bikes = self
            .mapper
            .map_all::<Bike>(
                "SELECT * FROM bikes WHERE id = $1",
                &[SqlParam::Integer(bike_id)],
            )
            .await?;
        Ok(bikes.into_iter().next())
    }

    /// List the whole fleet.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_bikes(&self) -> Result<Vec<Bike>> {
        Ok(self
            .mapper
            .map_all::<Bike>("SELECT * FROM bikes ORDER BY id", &[])
            .await?)
    }

    /// List bikes currently available for rental.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_available_bikes(&self) -> Result<Vec<Bike>> {
        Ok(self
            .mapper
            .map_all::<Bike>("SELECT * FROM bikes WHERE is_available = 1 ORDER BY id", &[])
            .await?)
    }

    /// Update a bike's availability, position and pricing.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_bike(
        &self,
        bike_id: i64,
        is_available: bool,
        latitude: f64,
        longitude: f64,
        cost_per_minute: f64,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE bikes
            SET is_available = $1, latitude = $2, longitude = $3, cost_per_minute = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(is_available)
        .bind(latitude)
        .bind(longitude)
        .bind(cost_per_minute)
        .bind(format_timestamp(Utc::now()))
        .bind(bike_id)
        .execute(&self.pool)
        .await
        .context("failed to update bike")?;
        Ok(())
    }

    /// Flip a bike's availability without touching its other fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_bike_availability(&self, bike_id: i64, is_available: bool) -> Result<()> {
        sqlx::query("UPDATE bikes SET is_available = $1, updated_at = $2 WHERE id = $3")
            .bind(is_available)
            .bind(format_timestamp(Utc::now()))
            .bind(bike_id)
            .execute(&self.pool)
            .await
            .context("failed to update bike availability")?;
        Ok(())
    }

    /// Remove a bike from the fleet.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_bike(&self, bike_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bikes WHERE id = $1")
            .bind(bike_id)
            .execute(&self.pool)
            .await
            .context("failed to delete bike")?;
        Ok(result.rows_affected() > 0)
    }
}

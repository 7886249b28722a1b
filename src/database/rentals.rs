// ABOUTME: Rental database operations
// ABOUTME: Handles rental creation, closure, running-rental lookup and history

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::mapper::{format_timestamp, SqlParam};
use super::Database;
use crate::models::{Rental, RentalStatus};

impl Database {
    pub(super) async fn migrate_rentals(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS rentals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                bike_id INTEGER NOT NULL REFERENCES bikes(id),
                rental_status TEXT NOT NULL CHECK (rental_status IN ('running', 'ended')),
                start_time DATETIME NOT NULL,
                end_time DATETIME,
                start_latitude REAL NOT NULL,
                start_longitude REAL NOT NULL,
                end_latitude REAL,
                end_longitude REAL,
                duration INTEGER,
                cost REAL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_rentals_user ON rentals(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_rentals_status ON rentals(rental_status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Open a running rental and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_rental(
        &self,
        user_id: i64,
        bike_id: i64,
        start_time: DateTime<Utc>,
        start_latitude: f64,
        start_longitude: f64,
    ) -> Result<Rental> {
        let result = sqlx::query(
            r"
            INSERT INTO rentals (user_id, bike_id, rental_status, start_time, start_latitude, start_longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user_id)
        .bind(bike_id)
        .bind(RentalStatus::Running.as_str())
        .bind(format_timestamp(start_time))
        .bind(start_latitude)
        .bind(start_longitude)
        .execute(&self.pool)
        .await
        .context("failed to insert rental")?;

        self.get_rental(result.last_insert_rowid())
            .await?
            .context("inserted rental not found")
    }

    /// Look up a rental by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_rental(&self, rental_id: i64) -> Result<Option<Rental>> {
        let rentals = self
            .mapper
            .map_all::<Rental>(
                "SELECT * FROM rentals WHERE id = $1",
                &[SqlParam::Integer(rental_id)],
            )
            .await?;
        Ok(rentals.into_iter().next())
    }

    /// The user's running rental, if any. The service layer guarantees at
    /// most one exists per user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_running_rental(&self, user_id: i64) -> Result<Option<Rental>> {
        let rentals = self
            .mapper
            .map_all::<Rental>(
                "SELECT * FROM rentals WHERE user_id = $1 AND rental_status = $2",
                &[
                    SqlParam::Integer(user_id),
                    SqlParam::from(RentalStatus::Running.as_str()),
                ],
            )
            .await?;
        Ok(rentals.into_iter().next())
    }

    /// A user's rental history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_rentals_for_user(&self, user_id: i64) -> Result<Vec<Rental>> {
        Ok(self
            .mapper
            .map_all::<Rental>(
                "SELECT * FROM rentals WHERE user_id = $1 ORDER BY start_time DESC",
                &[SqlParam::Integer(user_id)],
            )
            .await?)
    }

    /// Every rental across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_rentals(&self) -> Result<Vec<Rental>> {
        Ok(self
            .mapper
            .map_all::<Rental>("SELECT * FROM rentals ORDER BY start_time DESC", &[])
            .await?)
    }

    /// Overwrite a rental's mutable columns with the given record's
    /// values. The admin surface merges partial updates into a loaded
    /// rental before calling this.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_rental(&self, rental: &Rental) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE rentals
            SET user_id = $1, bike_id = $2, rental_status = $3, start_time = $4, end_time = $5,
                start_latitude = $6, start_longitude = $7, end_latitude = $8, end_longitude = $9,
                duration = $10, cost = $11
            WHERE id = $12
            ",
        )
        .bind(rental.user_id)
        .bind(rental.bike_id)
        .bind(rental.rental_status.as_str())
        .bind(format_timestamp(rental.start_time))
        .bind(rental.end_time.map(format_timestamp))
        .bind(rental.start_latitude)
        .bind(rental.start_longitude)
        .bind(rental.end_latitude)
        .bind(rental.end_longitude)
        .bind(rental.duration_minutes)
        .bind(rental.cost)
        .bind(rental.id)
        .execute(&self.pool)
        .await
        .context("failed to update rental")?;
        Ok(result.rows_affected() > 0)
    }

    /// Close out a rental with its end-of-ride facts.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn end_rental(
        &self,
        rental_id: i64,
        end_time: DateTime<Utc>,
        end_latitude: f64,
        end_longitude: f64,
        duration_minutes: i64,
        cost: f64,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE rentals
            SET rental_status = $1, end_time = $2, end_latitude = $3, end_longitude = $4,
                duration = $5, cost = $6
            WHERE id = $7
            ",
        )
        .bind(RentalStatus::Ended.as_str())
        .bind(format_timestamp(end_time))
        .bind(end_latitude)
        .bind(end_longitude)
        .bind(duration_minutes)
        .bind(cost)
        .bind(rental_id)
        .execute(&self.pool)
        .await
        .context("failed to end rental")?;
        Ok(())
    }
}

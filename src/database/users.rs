// ABOUTME: User account database operations
// ABOUTME: Handles registration, lookup, profile updates and soft deletion

use anyhow::{Context, Result};
use chrono::Utc;

use super::mapper::{format_timestamp, SqlParam};
use super::Database;
use crate::models::User;

impl Database {
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL,
                hashed_password TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                deleted BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            r"
            INSERT INTO users (email, hashed_password, first_name, last_name, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6)
            ",
        )
        .bind(email)
        .bind(hashed_password)
        .bind(first_name)
        .bind(last_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("failed to insert user")?;

        self.get_user(result.last_insert_rowid())
            .await?
            .context("inserted user not found")
    }

    /// Look up a user by id, including soft-deleted accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let users = self
            .mapper
            .map_all::<User>(
                "SELECT * FROM users WHERE id = $1",
                &[SqlParam::Integer(user_id)],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    /// Look up a live (non-deleted) user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .mapper
            .map_all::<User>(
                "SELECT * FROM users WHERE email = $1 AND deleted = 0",
                &[SqlParam::from(email)],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    /// List every user account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_users(&self) -> Result<Vec<User>> {
        Ok(self
            .mapper
            .map_all::<User>("SELECT * FROM users ORDER BY id DESC", &[])
            .await?)
    }

    /// Update a user's profile fields and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_user(
        &self,
        user_id: i64,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users
            SET email = $1, first_name = $2, last_name = $3, updated_at = $4
            WHERE id = $5
            ",
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(format_timestamp(Utc::now()))
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("failed to update user")?;
        Ok(())
    }

    /// Soft-delete a user. The row stays for historical rentals; the account
    /// can no longer log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET deleted = 1, updated_at = $1 WHERE id = $2")
            .bind(format_timestamp(Utc::now()))
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }
}

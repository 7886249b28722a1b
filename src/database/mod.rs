// ABOUTME: Database handle, schema migrations and repository entry points
// ABOUTME: All reads flow through the generic row mapper; writes use parameterized statements
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Database Management
//!
//! The [`Database`] struct owns a SQLite connection pool and a [`RowMapper`]
//! over it. Per-entity operations live in sibling modules (`users`, `bikes`,
//! `rentals`) as `impl Database` blocks, the repositories of this crate.

pub mod mapper;

mod bikes;
mod rentals;
mod users;

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use self::mapper::RowMapper;

/// Database manager for users, bikes and rentals.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    mapper: RowMapper,
}

impl Database {
    /// Open a connection pool against `database_url` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be opened or migrations fail.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        let db = Self::from_pool(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// Wrap an existing pool without running migrations. Used by tests that
    /// build their own schema.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        let mapper = RowMapper::new(pool.clone());
        Self {
            pool,
            mapper,
        }
    }

    /// Reference to the underlying pool for advanced operations.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The shared row mapper over this database's pool.
    #[must_use]
    pub const fn mapper(&self) -> &RowMapper {
        &self.mapper
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_bikes().await?;
        self.migrate_rentals().await?;
        Ok(())
    }
}

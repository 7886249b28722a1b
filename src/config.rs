// ABOUTME: Environment-driven server configuration
// ABOUTME: Reads bind address, database URL, JWT secret and admin credentials from the environment

use std::env;

use anyhow::{Context, Result};

/// Default bind address when `ADDR` is unset.
const DEFAULT_ADDR: &str = "127.0.0.1:8080";
/// Default database URL when `DATABASE_URL` is unset.
const DEFAULT_DATABASE_URL: &str = "sqlite:./velo-rental.db";
/// Session token lifetime in days.
const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Credentials the admin surface accepts via HTTP Basic auth.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
}

/// Server configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8080`.
    pub addr: String,
    /// SQLite database URL.
    pub database_url: String,
    /// HMAC secret for session tokens.
    pub jwt_secret: String,
    /// Admin Basic-auth credentials.
    pub admin: AdminCredentials,
    /// Session token lifetime in days.
    pub token_expiry_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` and `ADMIN_CREDENTIALS` (`user:password`) are required;
    /// `ADDR` and `DATABASE_URL` fall back to local defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or malformed.
    pub fn from_env() -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| env::var(name).is_err())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let addr = env::var("ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET must be at least 16 characters");
        }
        let admin = parse_admin_credentials(
            &env::var("ADMIN_CREDENTIALS").context("ADMIN_CREDENTIALS must be set")?,
        )?;
        let token_expiry_days = match env::var("TOKEN_EXPIRY_DAYS") {
            Ok(raw) => raw
                .parse()
                .context("TOKEN_EXPIRY_DAYS must be a positive integer")?,
            Err(_) => DEFAULT_TOKEN_EXPIRY_DAYS,
        };

        Ok(Self {
            addr,
            database_url,
            jwt_secret,
            admin,
            token_expiry_days,
        })
    }

    /// Human-readable configuration overview for startup logging.
    ///
    /// Secrets are never included.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Velo Rental Server Configuration:\n\
             - Bind Address: {}\n\
             - Database: {}\n\
             - Admin User: {}\n\
             - Token Expiry: {} days",
            self.addr,
            if self.database_url.starts_with("sqlite:") {
                "SQLite"
            } else {
                "unknown"
            },
            self.admin.username,
            self.token_expiry_days
        )
    }
}

/// Environment variables that must be set for the server to start.
const REQUIRED_VARS: &[&str] = &["JWT_SECRET", "ADMIN_CREDENTIALS"];

fn parse_admin_credentials(raw: &str) -> Result<AdminCredentials> {
    let (username, password) = raw
        .split_once(':')
        .context("ADMIN_CREDENTIALS must be in user:password form")?;
    if username.is_empty() || password.is_empty() {
        anyhow::bail!("ADMIN_CREDENTIALS must have a non-empty user and password");
    }
    Ok(AdminCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_credentials_split_on_first_colon() {
        let creds = parse_admin_credentials("admin:p:ss").unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "p:ss");
    }

    #[test]
    fn summary_names_the_backend_and_omits_secrets() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".to_string(),
            database_url: "sqlite:./velo-rental.db".to_string(),
            jwt_secret: "top-secret-signing-key".to_string(),
            admin: AdminCredentials {
                username: "admin".to_string(),
                password: "hunter2".to_string(),
            },
            token_expiry_days: 30,
        };

        let summary = config.summary();
        assert!(summary.contains("SQLite"));
        assert!(summary.contains("127.0.0.1:8080"));
        assert!(summary.contains("30 days"));
        assert!(!summary.contains("top-secret-signing-key"));
        assert!(!summary.contains("hunter2"));
    }

    #[test]
    fn admin_credentials_reject_malformed_input() {
        assert!(parse_admin_credentials("no-colon").is_err());
        assert!(parse_admin_credentials(":password").is_err());
        assert!(parse_admin_credentials("user:").is_err());
    }
}

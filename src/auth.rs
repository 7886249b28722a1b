// ABOUTME: JWT-based user authentication and password hashing
// ABOUTME: Handles token generation, validation and bcrypt credential checks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Authentication
//!
//! The [`AuthManager`] signs and validates the HS256 bearer tokens riders
//! present on protected routes, and wraps bcrypt for password storage.
//! Tokens carry the user's id as `sub` plus the profile fields clients need
//! for display, and expire after a configurable number of days.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Bcrypt work factor for password hashing.
const BCRYPT_COST: u32 = 12;

/// JWT claims for an authenticated user session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string per JWT convention.
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    /// User's email address.
    pub email: String,
    /// User's given name.
    pub first_name: String,
    /// User's family name.
    pub last_name: String,
}

/// Signs and validates session tokens.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_days: i64,
}

impl AuthManager {
    /// Create a manager over a shared HMAC secret.
    #[must_use]
    pub fn new(jwt_secret: &[u8], token_expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret),
            decoding_key: DecodingKey::from_secret(jwt_secret),
            token_expiry_days,
        }
    }

    /// Generate a signed token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let expiry = Utc::now() + Duration::days(self.token_expiry_days);
        let claims = Claims {
            sub: user.id.to_string(),
            exp: expiry.timestamp(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("failed to sign token: {e}")))
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an authentication error for expired, malformed or
    /// wrongly-signed tokens.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                if matches!(
                    e.kind(),
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature
                ) {
                    AppError::auth_expired()
                } else {
                    AppError::auth_invalid(format!("invalid token: {e}"))
                }
            })?;
        Ok(token_data.claims)
    }

    /// Validate a token and return the user id it names.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the token or its `sub` claim is
    /// invalid.
    pub fn extract_user_id(&self, token: &str) -> AppResult<i64> {
        let claims = self.validate_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| AppError::auth_invalid("token subject is not a user id"))
    }
}

/// Hash a password for storage.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AppError::internal(format!("failed to hash password: {e}")))
}

/// Check a candidate password against a stored hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, hashed: &str) -> AppResult<bool> {
    bcrypt::verify(password, hashed)
        .map_err(|e| AppError::internal(format!("failed to verify password: {e}")))
}

/// Strip a `Bearer ` prefix from an Authorization header value.
///
/// # Errors
///
/// Returns an authentication error if the scheme is not Bearer.
pub fn bearer_token(header_value: &str) -> AppResult<&str> {
    header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth_invalid("expected Bearer authorization"))
}

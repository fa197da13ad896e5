//! Authentication-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register / login request body
#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, max = 128, message = "login must not be empty"))]
    pub login: String,
    #[validate(length(min = 1, max = 1024, message = "password must not be empty"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, max = 512))]
    pub refresh_token: String,
}

/// Result of register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIssueResult {
    /// Bearer JWT or session identifier, depending on the strategy
    pub token: String,
    pub refresh_token: String,
    /// Seconds until `token` expires
    pub ttl: u64,
}

/// Live credential record, one row per user.
///
/// Only SHA-256 digests of the access credential and of the refresh token are
/// persisted; raw values go to the client once, at issuance.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecord {
    pub user_id: i64,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Access credential still inside its TTL
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Refresh token still inside its window
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_expires_at
    }
}

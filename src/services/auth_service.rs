//! 认证服务：注册、登录、登出、刷新、删除用户
//!
//! `AuthService` is the strategy boundary. Both variants share the account
//! logic in [`AuthCore`] and differ only in how the access credential is
//! minted, carried and resolved.

use crate::{
    auth::{jwt::IssuedToken, password::PasswordHasher, random::RandomTokenGenerator},
    config::{AuthStrategy, SecurityConfig},
    error::AppError,
    models::{
        auth::{Credentials, TokenIssueResult, TokenRecord},
        user::User,
    },
    repository::Stores,
};
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use std::time::Duration;
use validator::Validate;

/// Token lifetimes and sizes, read-only after startup
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub refresh_token_length: usize,
}

impl TokenSettings {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            access_ttl: Duration::from_secs(config.access_token_ttl_secs),
            refresh_ttl: Duration::from_secs(config.refresh_token_ttl_secs),
            refresh_token_length: config.refresh_token_length,
        }
    }
}

/// Authentication strategy contract
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> AuthStrategy;

    /// Create the user and sign them in
    async fn register(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError>;

    /// Check credentials and issue a new credential pair
    async fn sign_in(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError>;

    /// Drop the caller's live record. Idempotent.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError>;

    /// Administrative delete; `false` when no such user
    async fn delete(&self, user_id: i64) -> Result<bool, AppError>;

    /// Resolve the caller from request headers; rejects anything not live
    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AppError>;

    /// Rotate both credentials using the refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenIssueResult, AppError>;
}

/// Account logic shared by every strategy.
///
/// Each strategy passes its own `mint` function for the access credential;
/// everything else about issuing and rotating is the same.
pub(crate) struct AuthCore {
    stores: Stores,
    hasher: PasswordHasher,
    settings: TokenSettings,
    /// Verified against when the login is unknown, so both failure paths cost one hash
    dummy_hash: String,
}

impl AuthCore {
    pub(crate) fn new(
        stores: Stores,
        hasher: PasswordHasher,
        settings: TokenSettings,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(&RandomTokenGenerator::generate(32))?;

        Ok(Self {
            stores,
            hasher,
            settings,
            dummy_hash,
        })
    }

    pub(crate) fn stores(&self) -> &Stores {
        &self.stores
    }

    pub(crate) fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub(crate) async fn register<F>(
        &self,
        credentials: &Credentials,
        mint: F,
    ) -> Result<TokenIssueResult, AppError>
    where
        F: Fn(&User) -> Result<IssuedToken, AppError>,
    {
        let user = self.create_user(credentials).await?;
        metrics::counter!("auth_registrations_total").increment(1);

        self.issue(&user, mint(&user)?).await
    }

    pub(crate) async fn sign_in<F>(
        &self,
        credentials: &Credentials,
        mint: F,
    ) -> Result<TokenIssueResult, AppError>
    where
        F: Fn(&User) -> Result<IssuedToken, AppError>,
    {
        let user = self.check_credentials(credentials).await?;

        // the user may have been deleted since the password check
        self.issue(&user, mint(&user)?).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::InvalidCredentials,
            e => e,
        })
    }

    pub(crate) async fn refresh<F>(
        &self,
        refresh_token: &str,
        mint: F,
    ) -> Result<TokenIssueResult, AppError>
    where
        F: Fn(&User) -> Result<IssuedToken, AppError>,
    {
        let (record, user) = self.refresh_owner(refresh_token).await?;

        let access = mint(&user)?;
        let new_refresh = RandomTokenGenerator::generate(self.settings.refresh_token_length);
        let replacement = self.record_for(&user, &access, &new_refresh);

        if !self
            .stores
            .tokens
            .replace_by_refresh_token(&record.refresh_token_hash, &replacement)
            .await?
        {
            tracing::debug!(user_id = user.id, "Refresh token already rotated");
            return Err(AppError::Unauthorized);
        }

        tracing::info!(user_id = user.id, "Credentials refreshed");
        Ok(self.issue_result(access.token, new_refresh))
    }

    /// Validate, check the login is free, hash and insert.
    ///
    /// The existence check only produces the early error; the store's unique
    /// constraint decides concurrent registrations.
    async fn create_user(&self, credentials: &Credentials) -> Result<User, AppError> {
        credentials.validate()?;

        if self
            .stores
            .users
            .find_by_login(&credentials.login)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(credentials.login.clone()));
        }

        let password_hash = self.hasher.hash_blocking(&credentials.password).await?;
        let user = self
            .stores
            .users
            .create(&credentials.login, &password_hash)
            .await?;

        tracing::info!(user_id = user.id, login = %user.login, "User registered");
        Ok(user)
    }

    /// Unknown login and wrong password both end in `InvalidCredentials`
    async fn check_credentials(&self, credentials: &Credentials) -> Result<User, AppError> {
        let user = self.stores.users.find_by_login(&credentials.login).await?;

        let hash = user
            .as_ref()
            .map_or(self.dummy_hash.as_str(), |u| u.password_hash.as_str());
        let matches = self
            .hasher
            .verify_blocking(hash, &credentials.password)
            .await?;

        match user {
            Some(user) if matches => Ok(user),
            _ => {
                metrics::counter!("auth_sign_in_failures_total").increment(1);
                tracing::info!("Sign-in rejected");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    /// Find the live record and owner for a presented refresh token
    async fn refresh_owner(&self, refresh_token: &str) -> Result<(TokenRecord, User), AppError> {
        let record = self
            .stores
            .tokens
            .find_by_refresh_token(&RandomTokenGenerator::hash(refresh_token))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !record.can_refresh(Utc::now()) {
            return Err(AppError::Unauthorized);
        }

        let user = self
            .stores
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok((record, user))
    }

    /// Remove the user, then any token row a backend without cascade left behind
    pub(crate) async fn delete_user(&self, user_id: i64) -> Result<bool, AppError> {
        if !self.stores.users.delete(user_id).await? {
            return Ok(false);
        }
        self.stores.tokens.delete_by_user(user_id).await?;

        tracing::info!(user_id, "User deleted");
        Ok(true)
    }

    /// Persist a fresh credential pair, superseding the previous record
    async fn issue(&self, user: &User, access: IssuedToken) -> Result<TokenIssueResult, AppError> {
        let refresh_token = RandomTokenGenerator::generate(self.settings.refresh_token_length);

        self.stores
            .tokens
            .upsert(&self.record_for(user, &access, &refresh_token))
            .await?;

        tracing::info!(user_id = user.id, "Credentials issued");
        Ok(self.issue_result(access.token, refresh_token))
    }

    fn record_for(&self, user: &User, access: &IssuedToken, refresh_token: &str) -> TokenRecord {
        let refresh_ttl = chrono::Duration::from_std(self.settings.refresh_ttl)
            .unwrap_or_else(|_| chrono::Duration::zero());

        TokenRecord {
            user_id: user.id,
            access_token_hash: RandomTokenGenerator::hash(&access.token),
            refresh_token_hash: RandomTokenGenerator::hash(refresh_token),
            expires_at: access.expires_at,
            refresh_expires_at: Utc::now() + refresh_ttl,
        }
    }

    fn issue_result(&self, token: String, refresh_token: String) -> TokenIssueResult {
        TokenIssueResult {
            token,
            refresh_token,
            ttl: self.settings.access_ttl.as_secs(),
        }
    }
}

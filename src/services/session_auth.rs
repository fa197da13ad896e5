//! Cookie session strategy
//!
//! The access credential is an opaque session identifier carried in a
//! cookie. The server-side record keyed by its digest is the session.

use crate::{
    auth::{
        jwt::{IssuedToken, TokenError},
        middleware::extract_cookie,
        random::RandomTokenGenerator,
    },
    config::AuthStrategy,
    error::AppError,
    models::{
        auth::{Credentials, TokenIssueResult},
        user::User,
    },
    services::auth_service::{AuthCore, AuthService},
};
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;

/// Session identifier length (alphanumeric, ~357 bits)
pub const SESSION_ID_LENGTH: usize = 60;

pub struct SessionAuthService {
    core: AuthCore,
    cookie_name: String,
}

impl SessionAuthService {
    pub(crate) fn new(core: AuthCore, cookie_name: impl Into<String>) -> Self {
        Self {
            core,
            cookie_name: cookie_name.into(),
        }
    }

    fn mint_access(&self) -> Result<IssuedToken, AppError> {
        let ttl = chrono::Duration::from_std(self.core.settings().access_ttl)
            .map_err(|e| AppError::Internal(format!("session ttl out of range: {}", e)))?;

        Ok(IssuedToken {
            token: RandomTokenGenerator::generate(SESSION_ID_LENGTH),
            expires_at: Utc::now() + ttl,
        })
    }
}

#[async_trait]
impl AuthService for SessionAuthService {
    fn kind(&self) -> AuthStrategy {
        AuthStrategy::Session
    }

    async fn register(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError> {
        self.core.register(&credentials, |_| self.mint_access()).await
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError> {
        self.core.sign_in(&credentials, |_| self.mint_access()).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenIssueResult, AppError> {
        self.core.refresh(refresh_token, |_| self.mint_access()).await
    }

    async fn delete(&self, user_id: i64) -> Result<bool, AppError> {
        self.core.delete_user(user_id).await
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AppError> {
        let session_id = extract_cookie(headers, &self.cookie_name).ok_or(AppError::Unauthorized)?;

        let stores = self.core.stores();
        let record = stores
            .tokens
            .find_by_access_token(&RandomTokenGenerator::hash(&session_id))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !record.is_live(Utc::now()) {
            return Err(AppError::Token(TokenError::Expired));
        }

        stores
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let session_id = extract_cookie(headers, &self.cookie_name).ok_or(AppError::Unauthorized)?;

        let removed = self
            .core
            .stores()
            .tokens
            .delete_by_access_token(&RandomTokenGenerator::hash(&session_id))
            .await?;

        tracing::info!(removed, "Session closed");
        Ok(())
    }
}

//! Bearer token strategy
//!
//! The access credential is a signed JWT carried in `Authorization: Bearer`.
//! Each request re-derives the caller from the token and cross-checks it
//! against the user's live record, so sign-out, re-issue and user deletion
//! all invalidate older tokens.

use crate::{
    auth::{
        jwt::{IssuedToken, TokenError, TokenIssuer},
        middleware::extract_bearer_token,
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
use std::sync::Arc;

pub struct TokenAuthService {
    core: AuthCore,
    issuer: Arc<TokenIssuer>,
}

impl TokenAuthService {
    pub(crate) fn new(core: AuthCore, issuer: Arc<TokenIssuer>) -> Self {
        Self { core, issuer }
    }

    fn mint_access(&self, user: &User) -> Result<IssuedToken, AppError> {
        self.issuer.issue(&user.login, self.core.settings().access_ttl)
    }
}

#[async_trait]
impl AuthService for TokenAuthService {
    fn kind(&self) -> AuthStrategy {
        AuthStrategy::Token
    }

    async fn register(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError> {
        self.core
            .register(&credentials, |user| self.mint_access(user))
            .await
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<TokenIssueResult, AppError> {
        self.core
            .sign_in(&credentials, |user| self.mint_access(user))
            .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenIssueResult, AppError> {
        self.core
            .refresh(refresh_token, |user| self.mint_access(user))
            .await
    }

    async fn delete(&self, user_id: i64) -> Result<bool, AppError> {
        self.core.delete_user(user_id).await
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AppError> {
        let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
        let claims = self.issuer.verify(&token)?;

        let stores = self.core.stores();
        let user = stores
            .users
            .find_by_login(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!(login = %claims.sub, "Token subject no longer exists");
                AppError::Unauthorized
            })?;

        // only the most recently issued token for this user is accepted
        let record = stores
            .tokens
            .find_by_user(user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if record.access_token_hash != RandomTokenGenerator::hash(&token) {
            tracing::debug!(user_id = user.id, "Token superseded or signed out");
            return Err(AppError::Unauthorized);
        }
        if !record.is_live(Utc::now()) {
            return Err(AppError::Token(TokenError::Expired));
        }

        Ok(user)
    }

    /// Expired tokens may still sign out; only the stored digest is matched
    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;

        let removed = self
            .core
            .stores()
            .tokens
            .delete_by_access_token(&RandomTokenGenerator::hash(&token))
            .await?;

        tracing::info!(removed, "Signed out");
        Ok(())
    }
}

//! Business logic services layer

pub mod auth_service;
pub mod session_auth;
pub mod token_auth;

pub use auth_service::AuthService;
pub(crate) use auth_service::{AuthCore, TokenSettings};
pub use session_auth::SessionAuthService;
pub use token_auth::TokenAuthService;

use crate::{
    auth::{jwt::TokenIssuer, password::PasswordHasher},
    config::{AuthStrategy, SecurityConfig},
    error::AppError,
    repository::Stores,
};
use std::sync::Arc;

/// Build the configured strategy. Called once at startup.
pub fn build_auth_service(
    config: &SecurityConfig,
    stores: Stores,
) -> Result<Arc<dyn AuthService>, AppError> {
    let core = AuthCore::new(
        stores,
        PasswordHasher::from_config(config)?,
        TokenSettings::from_config(config),
    )?;

    let service: Arc<dyn AuthService> = match config.strategy {
        AuthStrategy::Token => Arc::new(TokenAuthService::new(
            core,
            Arc::new(TokenIssuer::from_config(config)?),
        )),
        AuthStrategy::Session => {
            Arc::new(SessionAuthService::new(core, config.session_cookie_name.clone()))
        }
    };

    tracing::info!(strategy = ?config.strategy, "Auth service initialized");
    Ok(service)
}

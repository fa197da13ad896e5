//! Database repository layer
//!
//! `UserStore` and `TokenStore` are the only components that mutate persisted
//! state. Lookups return `Ok(None)` for "not found", keeping it apart from a
//! storage error.

pub mod memory;
pub mod token_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use token_repo::TokenRepository;
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{auth::TokenRecord, user::User},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Persistence of user identity and password hash
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A taken login fails with `AlreadyExists`.
    async fn create(&self, login: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError>;

    /// Remove a user and, with it, the user's token record. `false` if absent.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// Persistence of live token records, one per user
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or overwrite the user's record. Fails with `NotFound` when the
    /// user no longer exists.
    async fn upsert(&self, record: &TokenRecord) -> Result<(), AppError>;

    /// Overwrite the user's record only if it still carries
    /// `refresh_token_hash`. `false` when another rotation won the race.
    async fn replace_by_refresh_token(
        &self,
        refresh_token_hash: &str,
        record: &TokenRecord,
    ) -> Result<bool, AppError>;

    async fn find_by_user(&self, user_id: i64) -> Result<Option<TokenRecord>, AppError>;

    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError>;

    async fn find_by_refresh_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError>;

    async fn delete_by_user(&self, user_id: i64) -> Result<bool, AppError>;

    async fn delete_by_access_token(&self, token_hash: &str) -> Result<bool, AppError>;
}

/// The pair of stores the auth services run against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    /// Set for the PostgreSQL backend, used by the readiness check
    pub pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            tokens: Arc::new(TokenRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tokens: store,
            pool: None,
        }
    }
}

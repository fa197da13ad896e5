//! In-memory store backend
//!
//! Mirrors the PostgreSQL schema constraints: unique login, one token row per
//! user, cascade on user delete, and no token row for a missing user. The
//! mutex is only held for the synchronous map operation.

use crate::{
    error::AppError,
    models::{auth::TokenRecord, user::User},
    repository::{TokenStore, UserStore},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, User>,
    logins: HashMap<String, i64>,
    tokens: HashMap<i64, TokenRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User, AppError> {
        let mut inner = self.lock()?;

        if inner.logins.contains_key(login) {
            return Err(AppError::AlreadyExists(login.to_string()));
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
        };
        inner.logins.insert(user.login.clone(), user.id);
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .logins
            .get(login)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut inner = self.lock()?;

        let Some(user) = inner.users.remove(&id) else {
            return Ok(false);
        };
        inner.logins.remove(&user.login);
        inner.tokens.remove(&id);

        Ok(true)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn upsert(&self, record: &TokenRecord) -> Result<(), AppError> {
        let mut inner = self.lock()?;

        if !inner.users.contains_key(&record.user_id) {
            return Err(AppError::NotFound(format!(
                "user with id {} does not exists",
                record.user_id
            )));
        }
        inner.tokens.insert(record.user_id, record.clone());

        Ok(())
    }

    async fn replace_by_refresh_token(
        &self,
        refresh_token_hash: &str,
        record: &TokenRecord,
    ) -> Result<bool, AppError> {
        let mut inner = self.lock()?;

        match inner.tokens.get_mut(&record.user_id) {
            Some(current) if current.refresh_token_hash == refresh_token_hash => {
                *current = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Option<TokenRecord>, AppError> {
        Ok(self.lock()?.tokens.get(&user_id).cloned())
    }

    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError> {
        Ok(self
            .lock()?
            .tokens
            .values()
            .find(|record| record.access_token_hash == token_hash)
            .cloned())
    }

    async fn find_by_refresh_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError> {
        Ok(self
            .lock()?
            .tokens
            .values()
            .find(|record| record.refresh_token_hash == token_hash)
            .cloned())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.tokens.remove(&user_id).is_some())
    }

    async fn delete_by_access_token(&self, token_hash: &str) -> Result<bool, AppError> {
        let mut inner = self.lock()?;

        let owner = inner
            .tokens
            .iter()
            .find(|(_, record)| record.access_token_hash == token_hash)
            .map(|(user_id, _)| *user_id);

        Ok(match owner {
            Some(user_id) => inner.tokens.remove(&user_id).is_some(),
            None => false,
        })
    }
}

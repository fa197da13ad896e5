//! Token repository (令牌数据访问)

use crate::{
    error::{is_foreign_key_violation, AppError},
    models::auth::TokenRecord,
    repository::TokenStore,
};
use async_trait::async_trait;
use sqlx::PgPool;

const SELECT_COLUMNS: &str =
    "SELECT user_id, access_token_hash, refresh_token_hash, expires_at, refresh_expires_at FROM auth_tokens";

pub struct TokenRepository {
    db: PgPool,
}

impl TokenRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_where(&self, clause: &str, value: &str) -> Result<Option<TokenRecord>, AppError> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!("{} WHERE {} = $1", SELECT_COLUMNS, clause))
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        Ok(record)
    }
}

/// 用户已被删除时外键冲突
fn missing_owner(err: sqlx::Error, user_id: i64) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::NotFound(format!("user with id {} does not exists", user_id))
    } else {
        err.into()
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    /// 写入令牌记录，覆盖该用户已有的记录
    async fn upsert(&self, record: &TokenRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (
                user_id, access_token_hash, refresh_token_hash, expires_at, refresh_expires_at
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                access_token_hash = EXCLUDED.access_token_hash,
                refresh_token_hash = EXCLUDED.refresh_token_hash,
                expires_at = EXCLUDED.expires_at,
                refresh_expires_at = EXCLUDED.refresh_expires_at,
                updated_at = NOW()
            "#,
        )
        .bind(record.user_id)
        .bind(&record.access_token_hash)
        .bind(&record.refresh_token_hash)
        .bind(record.expires_at)
        .bind(record.refresh_expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| missing_owner(e, record.user_id))?;

        Ok(())
    }

    /// 仅当刷新令牌仍匹配时替换记录
    async fn replace_by_refresh_token(
        &self,
        refresh_token_hash: &str,
        record: &TokenRecord,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET
                access_token_hash = $3,
                refresh_token_hash = $4,
                expires_at = $5,
                refresh_expires_at = $6,
                updated_at = NOW()
            WHERE user_id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(record.user_id)
        .bind(refresh_token_hash)
        .bind(&record.access_token_hash)
        .bind(&record.refresh_token_hash)
        .bind(record.expires_at)
        .bind(record.refresh_expires_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Option<TokenRecord>, AppError> {
        let record = sqlx::query_as::<_, TokenRecord>(&format!("{} WHERE user_id = $1", SELECT_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(record)
    }

    async fn find_by_access_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError> {
        self.find_where("access_token_hash", token_hash).await
    }

    async fn find_by_refresh_token(&self, token_hash: &str) -> Result<Option<TokenRecord>, AppError> {
        self.find_where("refresh_token_hash", token_hash).await
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_access_token(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE access_token_hash = $1")
            .bind(token_hash)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

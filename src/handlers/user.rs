//! 用户管理的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser, error::AppError, middleware::AppState,
    models::user::UserResponse,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 获取当前用户信息
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// 删除用户
///
/// 任何已认证用户都可以删除任意账户；删除他人账户时以 warn 级别记录操作者
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::BadRequest("user id must be int".to_string()))?;

    if !state.auth_service.delete(id).await? {
        return Err(AppError::NotFound(format!("user with id {} does not exists", id)));
    }

    if caller.id == id {
        tracing::info!(user_id = id, "User removed own account");
    } else {
        tracing::warn!(
            user_id = id,
            actor_id = caller.id,
            actor_login = %caller.login,
            "User removed another account"
        );
    }

    Ok(Json(json!({"status": true})))
}

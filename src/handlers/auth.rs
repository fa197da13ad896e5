//! 认证相关的 HTTP 处理器

use crate::{
    config::{AuthStrategy, SecurityConfig},
    error::AppError,
    handlers::json_body,
    middleware::AppState,
    models::auth::*,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppError> {
    let credentials = json_body(body)?;

    let result = state.auth_service.register(credentials).await?;

    issued_response(&state, StatusCode::CREATED, result)
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AppError> {
    let credentials = json_body(body)?;

    let result = state.auth_service.sign_in(credentials).await?;

    issued_response(&state, StatusCode::OK, result)
}

/// 刷新令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = json_body(body)?;
    req.validate()?;

    let result = state.auth_service.refresh(&req.refresh_token).await?;

    issued_response(&state, StatusCode::OK, result)
}

/// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.auth_service.sign_out(&headers).await?;

    let body = Json(json!({"status": true}));

    if state.auth_service.kind() == AuthStrategy::Session {
        let cookie = clear_session_cookie(&state.config.security)?;
        return Ok(([(header::SET_COOKIE, cookie)], body).into_response());
    }

    Ok(body.into_response())
}

/// 会话策略下同时下发 Cookie
fn issued_response(
    state: &AppState,
    status: StatusCode,
    result: TokenIssueResult,
) -> Result<Response, AppError> {
    if state.auth_service.kind() == AuthStrategy::Session {
        let cookie = session_cookie(&state.config.security, &result.token, result.ttl)?;
        return Ok((status, [(header::SET_COOKIE, cookie)], Json(result)).into_response());
    }

    Ok((status, Json(result)).into_response())
}

fn session_cookie(config: &SecurityConfig, session_id: &str, ttl: u64) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie_name, session_id, ttl
    );
    if config.session_cookie_secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(format!("invalid cookie: {}", e)))
}

fn clear_session_cookie(config: &SecurityConfig) -> Result<HeaderValue, AppError> {
    session_cookie(config, "", 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = SecurityConfig {
            strategy: AuthStrategy::Session,
            jwt_secret: Secret::new("x".repeat(32)),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            refresh_token_length: 64,
            session_cookie_name: "sid".to_string(),
            session_cookie_secure: true,
            password_hash_memory_kib: 4096,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
        };

        let cookie = session_cookie(&config, "abc", 900).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "sid=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=900; Secure"
        );

        config.session_cookie_secure = false;
        let cleared = clear_session_cookie(&config).unwrap();
        assert_eq!(
            cleared.to_str().unwrap(),
            "sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        );
    }
}

//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use filesender_auth::{
    config::{
        AppConfig, AuthStrategy, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
        StorageBackend,
    },
    middleware::AppState,
    repository::Stores,
    routes,
    services::{build_auth_service, AuthService},
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置（内存后端，低开销的 Argon2 参数）
pub fn create_test_config(strategy: AuthStrategy) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: Secret::new(String::new()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            strategy,
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            refresh_token_length: 64,
            session_cookie_name: "filesender_session".to_string(),
            session_cookie_secure: false,
            password_hash_memory_kib: 4096,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
        },
    }
}

/// 在内存后端上构建认证服务
pub fn create_test_service(strategy: AuthStrategy) -> Arc<dyn AuthService> {
    let config = create_test_config(strategy);
    build_auth_service(&config.security, Stores::memory()).expect("Failed to build auth service")
}

/// 构建访问令牌有效期为 `access_ttl_secs` 的认证服务
pub fn create_test_service_with_access_ttl(
    strategy: AuthStrategy,
    access_ttl_secs: u64,
) -> Arc<dyn AuthService> {
    let mut config = create_test_config(strategy);
    config.security.access_token_ttl_secs = access_ttl_secs;
    build_auth_service(&config.security, Stores::memory()).expect("Failed to build auth service")
}

/// 创建测试应用
pub fn create_test_app(strategy: AuthStrategy) -> Router {
    let config = create_test_config(strategy);
    let auth_service =
        build_auth_service(&config.security, Stores::memory()).expect("Failed to build auth service");

    routes::create_router(Arc::new(AppState {
        config,
        auth_service,
        db: None,
    }))
}

/// 测试响应
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Set-Cookie 头（如果有）
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}

/// 发送请求并解析 JSON 响应
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

/// 注册用户，返回响应
pub async fn register(app: &Router, login: &str, password: &str) -> TestResponse {
    let body = serde_json::json!({"login": login, "password": password}).to_string();
    send(app, "POST", "/register", Some(&body), &[]).await
}

/// 登录，返回响应
pub async fn login(app: &Router, login: &str, password: &str) -> TestResponse {
    let body = serde_json::json!({"login": login, "password": password}).to_string();
    send(app, "POST", "/login", Some(&body), &[]).await
}

/// Bearer 认证头的值
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

//! 健康检查 API 集成测试

use axum::http::StatusCode;
use filesender_auth::config::AuthStrategy;

mod common;
use common::{create_test_app, send};

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(AuthStrategy::Token);

    let response = send(&app, "GET", "/health", None, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.body["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_readiness_endpoint_without_database() {
    // 内存后端没有外部依赖
    let app = create_test_app(AuthStrategy::Session);

    let response = send(&app, "GET", "/ready", None, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ready"], true);
    assert_eq!(response.body["checks"], serde_json::json!([]));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app(AuthStrategy::Token);

    let response = send(&app, "GET", "/sessions", None, &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // 未知路径不经过认证中间件
    let response = send(&app, "POST", "/users/1/password", None, &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

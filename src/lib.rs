//! 文件分享服务的认证子系统
//! 注册、登录、令牌 / 会话校验、登出与用户删除

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;

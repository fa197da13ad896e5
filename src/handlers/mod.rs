//! HTTP 处理器模块

pub mod auth;
pub mod health;
pub mod user;

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::AppError;

/// 请求体无法解析时对外返回的提示
pub const BAD_JSON_MESSAGE: &str = "bad json format";

/// 解包 JSON 请求体，解析失败统一为 400
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        AppError::BadRequest(BAD_JSON_MESSAGE.to_string())
    })
}

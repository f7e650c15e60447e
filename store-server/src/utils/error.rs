//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - API 响应结构
//!
//! # 错误码规范
//!
//! | 错误码 | 分类 | HTTP |
//! |------|------|------|
//! | E0000 | 成功 | 200 |
//! | E0002 | 验证失败 | 400 |
//! | E0003 | 资源不存在 | 404 |
//! | E3001 | 未认证 | 401 |
//! | E9002 | 数据库错误 | 500 |
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::validation("close_time must be HH:mm"))
//!
//! // 返回成功响应
//! Ok(ok(data))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::repository::RepoError;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功)
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 应用错误枚举
///
/// 认证失败一律折叠为 [`AppError::Unauthorized`]，不向调用方区分
/// 缺失令牌、过期、签名错误等原因。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (401) ==========
    #[error("Authentication required")]
    /// 未认证 (401)
    Unauthorized,

    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E3001"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "E0003"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "E0002"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E9002"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Unauthorized => "Please login first".to_string(),
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            // 系统错误只记录，不暴露细节
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::StoreNotFound(id) => AppError::NotFound(format!("Store {id} not found")),
            RepoError::Unavailable(msg) => AppError::Database(msg),
        }
    }
}

/// 处理器和服务层统一使用的 Result
pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

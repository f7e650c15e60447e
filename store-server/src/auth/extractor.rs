//! 已认证身份
//!
//! 由认证网关写入请求扩展，处理器以类型化提取器读取。

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

use super::access::RouteAccess;
use crate::AppError;

/// 通过认证网关的调用方身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    /// Identity Verifier 返回的 subject ID
    pub subject_id: String,
    /// 路由声明的访问级别
    pub access: RouteAccess,
}

/// 只读取网关写入的扩展，从不自行校验令牌。
/// 未经过网关的路由使用该提取器会得到 401。
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

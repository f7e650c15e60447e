//! 认证网关
//!
//! 从 `Authorization: Bearer <token>` 头提取令牌，交给 [`IdentityVerifier`] 校验，
//! 成功后将 [`AuthenticatedIdentity`] 注入请求扩展。
//!
//! # 错误处理
//!
//! | 情况 | HTTP 状态码 |
//! |------|------------|
//! | 无 Authorization 头 / 非 Bearer / 空令牌 | 401 Unauthorized |
//! | 校验失败 (格式、过期、签名、吊销、公钥不可用) | 401 Unauthorized |
//!
//! 对调用方不区分失败原因，细节只写入 `security` 日志。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderMap;
use http::header::AUTHORIZATION;

use super::access::RouteAccess;
use super::extractor::AuthenticatedIdentity;
use super::verifier::{IdentityVerifier, VerificationError};
use crate::AppError;
use crate::security_log;

/// 认证中间件的状态：校验器 + 路由声明的访问级别
#[derive(Clone)]
pub struct GateState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub access: RouteAccess,
}

/// 网关拒绝原因 (仅用于日志)
#[derive(Debug, PartialEq)]
pub enum GateRejection {
    MissingToken,
    Verification(VerificationError),
}

/// 提取 Bearer 令牌
///
/// scheme 大小写不敏感；缺失、非 Bearer 或令牌为空均视为没有令牌。
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// 对一组请求头执行认证，每次调用最多一次外部校验
pub async fn authenticate(
    verifier: &dyn IdentityVerifier,
    headers: &HeaderMap,
    access: RouteAccess,
) -> Result<AuthenticatedIdentity, GateRejection> {
    let token = extract_bearer(headers).ok_or(GateRejection::MissingToken)?;
    let subject_id = verifier
        .verify(token)
        .await
        .map_err(GateRejection::Verification)?;

    Ok(AuthenticatedIdentity { subject_id, access })
}

/// 认证中间件，由 [`super::GatedRouter`] 挂载到非 `Public` 路由
pub async fn require_identity(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate(gate.verifier.as_ref(), req.headers(), gate.access).await {
        Ok(identity) => {
            tracing::debug!(
                subject_id = %identity.subject_id,
                access = %gate.access,
                "Request authenticated"
            );
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(GateRejection::MissingToken) => {
            security_log!(
                "WARN",
                "auth_missing",
                access = gate.access.to_string(),
                uri = req.uri().to_string()
            );
            Err(AppError::unauthorized())
        }
        Err(GateRejection::Verification(e)) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.to_string(),
                access = gate.access.to_string(),
                uri = req.uri().to_string()
            );
            Err(AppError::unauthorized())
        }
    }
}

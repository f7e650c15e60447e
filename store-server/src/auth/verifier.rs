//! Identity Verifier
//!
//! 外部身份提供方的抽象：校验不透明的 bearer token，返回稳定的 subject ID。

use async_trait::async_trait;
use thiserror::Error;

/// 令牌校验错误
///
/// 网关对外统一折叠为 401，这里保留细分原因仅用于日志。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token rejected: {0}")]
    Rejected(String),

    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(String),
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => VerificationError::Expired,
            ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
            ErrorKind::InvalidToken => VerificationError::Malformed(e.to_string()),
            _ => VerificationError::Rejected(e.to_string()),
        }
    }
}

/// Validates a bearer token and yields the caller's subject identifier
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, VerificationError>;
}

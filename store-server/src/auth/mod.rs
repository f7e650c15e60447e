//! 认证模块
//!
//! - [`IdentityVerifier`] - 外部身份校验接口
//! - [`FirebaseVerifier`] - Firebase ID Token (RS256, JWK)
//! - [`JwtVerifier`] - 共享密钥 HS256 令牌
//! - [`GatedRouter`] / [`RouteAccess`] - 按路由声明访问级别
//! - [`require_identity`] - 认证中间件
//! - [`AuthenticatedIdentity`] - 处理器可用的身份提取器

pub mod access;
pub mod extractor;
pub mod firebase;
pub mod jwt;
pub mod middleware;
pub mod verifier;

pub use access::{GatedRouter, RouteAccess};
pub use extractor::AuthenticatedIdentity;
pub use firebase::{FirebaseConfig, FirebaseVerifier};
pub use jwt::{Claims, JwtConfig, JwtVerifier};
pub use middleware::{GateState, authenticate, extract_bearer, require_identity};
pub use verifier::{IdentityVerifier, VerificationError};

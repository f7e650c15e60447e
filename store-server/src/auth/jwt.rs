//! HS256 JWT 令牌服务
//!
//! 共享密钥模式的身份校验，用于本地部署与测试环境；
//! 生产环境默认使用 [`super::FirebaseVerifier`]。

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use super::verifier::{IdentityVerifier, VerificationError};
use crate::core::config::{ConfigError, env_or, env_parse_or};

/// 共享密钥最小长度
pub const MIN_SECRET_LEN: usize = 32;

/// JWT 配置
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (至少 32 字节)
    pub secret: String,
    /// 签发令牌的有效期 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_minutes", &self.expiration_minutes)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtConfig {
    /// 从环境变量加载
    ///
    /// 生产环境必须提供 `JWT_SECRET`；开发环境缺省时生成临时随机密钥。
    pub fn from_env(production: bool) -> Result<Self, ConfigError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= MIN_SECRET_LEN => secret,
            Ok(_) => {
                return Err(ConfigError::Invalid(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
            Err(_) if production => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, generating a temporary development key");
                generate_printable_secret()
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: env_parse_or("JWT_EXPIRATION_MINUTES", 1440),
            issuer: env_or("JWT_ISSUER", "store-server"),
            audience: env_or("JWT_AUDIENCE", "store-clients"),
        })
    }
}

/// 生成可打印的随机密钥 (开发环境)
pub fn generate_printable_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (调用方 ID)
    pub sub: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// HS256 令牌校验器
#[derive(Clone)]
pub struct JwtVerifier {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为指定 subject 签发令牌
    pub fn issue_token(&self, subject: &str) -> Result<String, VerificationError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: subject.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| VerificationError::Rejected(format!("token generation failed: {e}")))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, VerificationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        if token_data.claims.sub.trim().is_empty() {
            return Err(VerificationError::Rejected("empty subject".to_string()));
        }
        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<String, VerificationError> {
        self.validate_token(token).map(|claims| claims.sub)
    }
}

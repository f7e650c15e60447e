//! Firebase ID Token 校验
//!
//! RS256 签名，公钥来自 Google securetoken JWK 集合：
//! - 按 `Cache-Control: max-age` 缓存公钥，缺省 1 小时
//! - 遇到未知 `kid` 时刷新一次 (两次刷新间隔至少 30 秒)
//! - 校验 `aud == project_id`、`iss == https://securetoken.google.com/<project_id>`、
//!   `exp`、非空 `sub`、`auth_time` 不在未来

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::header::{CACHE_CONTROL, HeaderMap};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::verifier::{IdentityVerifier, VerificationError};

/// Google 发布的 Firebase 签名公钥 (JWK)
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const CLOCK_SKEW_SECS: i64 = 60;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Firebase 配置
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub jwks_url: String,
}

impl FirebaseConfig {
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    auth_time: Option<i64>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

/// Firebase ID Token 校验器
pub struct FirebaseVerifier {
    config: FirebaseConfig,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            keys: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.project_id]);
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["sub", "exp", "aud", "iss"]);
        validation
    }

    /// 取出 `kid` 对应的公钥，必要时刷新缓存
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, VerificationError> {
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }

        if self.recently_fetched().await {
            return Err(VerificationError::Rejected(format!("unknown key id {kid}")));
        }

        self.refresh().await?;
        self.cached_key(kid)
            .await?
            .ok_or_else(|| VerificationError::Rejected(format!("unknown key id {kid}")))
    }

    async fn cached_key(&self, kid: &str) -> Result<Option<DecodingKey>, VerificationError> {
        let guard = self.keys.read().await;
        let Some(cached) = guard.as_ref() else {
            return Ok(None);
        };
        if cached.expires_at <= Instant::now() {
            return Ok(None);
        }
        match cached.keys.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk)
                .map(Some)
                .map_err(|e| VerificationError::KeysUnavailable(format!("bad JWK {kid}: {e}"))),
            None => Ok(None),
        }
    }

    async fn recently_fetched(&self) -> bool {
        let guard = self.keys.read().await;
        guard.as_ref().is_some_and(|cached| {
            cached.expires_at > Instant::now() && cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL
        })
    }

    async fn refresh(&self) -> Result<(), VerificationError> {
        let response = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerificationError::KeysUnavailable(e.to_string()))?;

        let ttl = cache_max_age(response.headers()).unwrap_or(DEFAULT_KEY_TTL);
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| VerificationError::KeysUnavailable(e.to_string()))?;

        tracing::info!(
            keys = keys.keys.len(),
            ttl_secs = ttl.as_secs(),
            "Firebase signing keys refreshed"
        );

        let now = Instant::now();
        *self.keys.write().await = Some(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: now + ttl,
        });
        Ok(())
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<String, VerificationError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerificationError::Rejected(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerificationError::Malformed("missing kid".to_string()))?;

        let key = self.key_for(&kid).await?;
        let claims = decode::<FirebaseClaims>(token, &key, &self.validation())?.claims;

        if claims.sub.trim().is_empty() {
            return Err(VerificationError::Rejected("empty subject".to_string()));
        }
        if let Some(auth_time) = claims.auth_time
            && auth_time > chrono::Utc::now().timestamp() + CLOCK_SKEW_SECS
        {
            return Err(VerificationError::Rejected("auth_time in the future".to_string()));
        }

        Ok(claims.sub)
    }
}

/// 解析 `Cache-Control` 中的 `max-age`
fn cache_max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::auth::firebase::GOOGLE_JWKS_URL;
use crate::auth::jwt::generate_printable_secret;
use crate::auth::{FirebaseConfig, JwtConfig};
use crate::availability::SchedulerConfig;
use crate::db::MEMORY_DB;

/// 配置错误 (启动时致命)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 身份提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Firebase,
    Jwt,
}

impl FromStr for AuthProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(AuthProvider::Firebase),
            "jwt" => Ok(AuthProvider::Jwt),
            other => Err(ConfigError::Invalid(format!(
                "AUTH_PROVIDER must be 'firebase' or 'jwt', got '{other}'"
            ))),
        }
    }
}

/// 身份校验配置
#[derive(Debug, Clone)]
pub enum AuthConfig {
    Firebase(FirebaseConfig),
    Jwt(JwtConfig),
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/store-server | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | DB_PATH | `<WORK_DIR>/database` | RocksDB 目录，`memory` 为内存库 |
/// | DB_NAMESPACE / DB_DATABASE | store / store | SurrealDB ns/db |
/// | TIMEZONE | Asia/Seoul | 营业时区 |
/// | SCHEDULER_INTERVAL_SECS | 30 | 调度周期 (1..=60) |
/// | SCHEDULER_MAX_CONCURRENCY | 8 | 单 tick 并发开关店上限 |
/// | SCHEDULER_MAX_CATCH_UP_MINUTES | 5 | 迟到唤醒补跑分钟数 |
/// | AUTH_PROVIDER | firebase | firebase / jwt |
/// | FIREBASE_PROJECT_ID | - | firebase 必填 |
/// | FIREBASE_JWKS_URL | Google securetoken | 公钥地址 |
/// | JWT_SECRET / JWT_ISSUER / JWT_AUDIENCE | - / store-server / store-clients | jwt 模式 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 后台任务关闭超时 |
///
/// 日志相关的 `LOG_LEVEL` / `LOG_DIR` 在加载配置之前由
/// [`crate::setup_environment`] 读取。
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | production
    pub environment: String,
    /// 显式指定的数据库路径
    pub db_path: Option<String>,
    pub db_namespace: String,
    pub db_database: String,
    /// 营业时区
    pub timezone: Tz,
    pub scheduler_interval: Duration,
    pub scheduler_max_concurrency: usize,
    pub scheduler_max_catch_up_minutes: u32,
    /// 身份校验配置
    pub auth: AuthConfig,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 非法数值回退默认值并告警；身份提供方缺少必填项时返回错误。
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env_or("ENVIRONMENT", "development");
        let production = environment == "production";

        let provider: AuthProvider = env_or("AUTH_PROVIDER", "firebase").parse()?;
        let auth = match provider {
            AuthProvider::Firebase => AuthConfig::Firebase(FirebaseConfig {
                project_id: std::env::var("FIREBASE_PROJECT_ID")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
                jwks_url: env_or("FIREBASE_JWKS_URL", GOOGLE_JWKS_URL),
            }),
            AuthProvider::Jwt => AuthConfig::Jwt(JwtConfig::from_env(production)?),
        };

        Ok(Self {
            work_dir: env_or("WORK_DIR", "/var/lib/store-server"),
            http_port: env_parse_or("HTTP_PORT", 8080),
            environment,
            db_path: std::env::var("DB_PATH").ok().filter(|v| !v.trim().is_empty()),
            db_namespace: env_or("DB_NAMESPACE", "store"),
            db_database: env_or("DB_DATABASE", "store"),
            timezone: parse_timezone(&env_or("TIMEZONE", "Asia/Seoul")),
            scheduler_interval: clamp_interval(env_parse_or("SCHEDULER_INTERVAL_SECS", 30)),
            scheduler_max_concurrency: env_parse_or("SCHEDULER_MAX_CONCURRENCY", 8usize).max(1),
            scheduler_max_catch_up_minutes: env_parse_or("SCHEDULER_MAX_CATCH_UP_MINUTES", 5),
            auth,
            shutdown_timeout_ms: env_parse_or("SHUTDOWN_TIMEOUT_MS", 10_000),
        })
    }

    /// 内存数据库 + 临时 HS256 密钥的开发配置
    ///
    /// 常用于测试场景
    pub fn in_memory() -> Self {
        Self {
            work_dir: ".".to_string(),
            http_port: 0,
            environment: "development".to_string(),
            db_path: Some(MEMORY_DB.to_string()),
            db_namespace: "store".to_string(),
            db_database: "store".to_string(),
            timezone: chrono_tz::Asia::Seoul,
            scheduler_interval: Duration::from_secs(30),
            scheduler_max_concurrency: 8,
            scheduler_max_catch_up_minutes: 5,
            auth: AuthConfig::Jwt(JwtConfig {
                secret: generate_printable_secret(),
                expiration_minutes: 60,
                issuer: "store-server".to_string(),
                audience: "store-clients".to_string(),
            }),
            shutdown_timeout_ms: 10_000,
        }
    }

    /// 数据库路径 (`memory` 表示内存库)
    pub fn db_path(&self) -> String {
        self.db_path
            .clone()
            .unwrap_or_else(|| format!("{}/database", self.work_dir))
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.scheduler_interval,
            max_concurrency: self.scheduler_max_concurrency,
            max_catch_up_minutes: self.scheduler_max_catch_up_minutes,
            timezone: self.timezone,
        }
    }
}

/// 读取环境变量，未设置时使用默认值
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 读取并解析环境变量，未设置或非法时使用默认值
pub fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(
            key,
            value = %raw,
            default = %default,
            "Invalid config value, using default"
        );
        default
    })
}

/// 解析 IANA 时区名，非法时回退 UTC
fn parse_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone = %name, "Unknown timezone, falling back to UTC");
        Tz::UTC
    })
}

/// 调度周期必须落在 1..=60 秒，否则会错过分钟
fn clamp_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, 60))
}

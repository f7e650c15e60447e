//! Store Server - 店铺营业状态服务
//!
//! # 架构概述
//!
//! - **营业状态调度** (`availability`): 按时间与星期自动开关店
//! - **认证网关** (`auth`): Bearer 令牌 → Identity Verifier → subject ID
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **HTTP API** (`api`): 运营方手动操作接口
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # 身份校验、认证网关
//! ├── availability/  # 开关店状态机与调度器
//! ├── db/            # 数据库层
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、时间、校验
//! ```

pub mod api;
pub mod auth;
pub mod availability;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{AuthenticatedIdentity, IdentityVerifier, RouteAccess};
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

pub use utils::logger::init_logger_with_file;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境：加载 `.env`，按 `LOG_LEVEL` (默认 info) 与 `LOG_DIR` 初始化日志
///
/// 先于 [`Config::from_env`] 调用，配置加载期间的告警也会进入日志。
pub fn setup_environment() -> anyhow::Result<()> {
    if let Err(e) = dotenv::dotenv() {
        // 缺少 .env 文件是正常情况
        if !e.not_found() {
            anyhow::bail!("Failed to load .env file: {e}");
        }
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::{FirebaseVerifier, IdentityVerifier, JwtVerifier};
use crate::availability::AvailabilityScheduler;
use crate::core::config::AuthConfig;
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::StoreRepository;

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | 嵌入式数据库 |
/// | verifier | 身份校验器 |
/// | stores | 店铺仓储 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: Surreal<Db>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub stores: StoreRepository,
}

impl ServerState {
    /// 手动构造 (测试中注入桩校验器)
    pub fn new(config: Config, db: Surreal<Db>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            config: Arc::new(config),
            stores: StoreRepository::new(db.clone()),
            db,
            verifier,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 工作目录
    /// 2. 数据库 (RocksDB 或内存) + 索引
    /// 3. 身份校验器
    pub async fn initialize(config: &Config) -> Result<Self> {
        if config.db_path() != crate::db::MEMORY_DB {
            std::fs::create_dir_all(&config.work_dir)?;
        }

        let db_service = DbService::new(config)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;

        let verifier = build_verifier(&config.auth);
        Ok(Self::new(config.clone(), db_service.db, verifier))
    }

    /// 启动后台任务 (店铺营业状态调度器)
    ///
    /// 必须在 `Server::run()` 接受请求之前调用
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let scheduler = AvailabilityScheduler::new(
            Arc::new(self.stores.clone()),
            self.config.scheduler_config(),
            tasks.shutdown_token(),
        );
        tasks.spawn("store_availability", scheduler.run());

        tasks.log_summary();
        tasks
    }
}

/// 按配置构造身份校验器
pub fn build_verifier(auth: &AuthConfig) -> Arc<dyn IdentityVerifier> {
    match auth {
        AuthConfig::Firebase(config) => {
            tracing::info!(project_id = %config.project_id, "Using Firebase identity verifier");
            Arc::new(FirebaseVerifier::new(config.clone()))
        }
        AuthConfig::Jwt(config) => {
            tracing::info!(issuer = %config.issuer, "Using HS256 identity verifier");
            Arc::new(JwtVerifier::with_config(config.clone()))
        }
    }
}

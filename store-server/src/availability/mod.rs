//! 店铺营业状态自动切换
//!
//! - [`AvailabilityRepository`] - 调度器依赖的仓储接口
//! - [`AvailabilityScheduler`] - 按分钟驱动的开关店控制循环
//! - [`TickReport`] - 单次 tick 的执行结果
//!
//! # 状态机
//!
//! ```text
//!            isAuto ∧ now == sale_start ∧ weekday ∈ open_day_of_week
//!   Closed ───────────────────────────────────────────────────────▶ Open
//!     ▲                                                               │
//!     └────────────────────── now == close_time ◀─────────────────────┘
//! ```
//!
//! 手动开关店绕过守卫条件，直接由 [`crate::db::repository::StoreRepository`] 执行。

pub mod scheduler;

pub use scheduler::{AvailabilityScheduler, SchedulerConfig};

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::models::Store;
use crate::db::repository::RepoResult;

/// Repository operations the scheduler drives
///
/// `close` / `open` return `Ok(false)` when nothing was written
/// (store gone or already in the target state).
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn find_due_to_close(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>>;
    async fn find_due_to_open(&self, now: NaiveDateTime) -> RepoResult<Vec<Store>>;
    async fn close(&self, store_id: &str) -> RepoResult<bool>;
    async fn open(&self, store_id: &str) -> RepoResult<bool>;
}

/// 自动切换方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Open,
    Close,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Open => write!(f, "open"),
            Transition::Close => write!(f, "close"),
        }
    }
}

/// 单个失败项
///
/// `store_id` 为空表示候选查询本身失败。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionFailure {
    pub store_id: Option<String>,
    pub transition: Transition,
    pub error: String,
}

/// 单次 tick 的结果
///
/// `closed` / `opened` 只包含真正写入状态的店铺。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub closed: Vec<String>,
    pub opened: Vec<String>,
    pub failures: Vec<TransitionFailure>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.opened.is_empty() && self.failures.is_empty()
    }
}

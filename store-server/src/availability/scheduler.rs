//! 店铺自动开关店调度器
//!
//! 每个触发周期 (≤ 60s) 醒来一次，对尚未评估过的每一分钟执行一次 tick：
//!
//! 1. 固定本次 tick 的 `now` (两次查询共用，避免跨分钟不一致)
//! 2. 查询到点应关店的店铺并逐个关店
//! 3. 查询到点应开店的店铺并逐个开店
//!
//! 单个店铺失败只记录，不影响同一 tick 内其他店铺。
//! 已评估的分钟以 UTC 记录，只在匹配 `HH:mm` 与星期时换算为业务时区，
//! 因此系统时钟回拨不会重复评估，夏令时回退时每个真实分钟仍只评估一次。
//! 在 `start_background_tasks()` 中启动。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;

use super::{AvailabilityRepository, TickReport, Transition, TransitionFailure};
use crate::db::models::Store;
use crate::utils::time::{self, format_time_of_day, truncate_to_minute};

/// 调度器参数
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// 触发周期
    pub interval: Duration,
    /// 单个 tick 内并发执行的开关店数量上限
    pub max_concurrency: usize,
    /// 迟到唤醒时最多补跑的分钟数
    pub max_catch_up_minutes: u32,
    /// 业务时区
    pub timezone: Tz,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_concurrency: 8,
            max_catch_up_minutes: 5,
            timezone: chrono_tz::Asia::Seoul,
        }
    }
}

/// 店铺营业状态调度器
pub struct AvailabilityScheduler<R> {
    repo: Arc<R>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
    /// 最近一次已评估的分钟 (UTC)
    last_minute: Option<DateTime<Utc>>,
}

impl<R> AvailabilityScheduler<R>
where
    R: AvailabilityRepository + 'static,
{
    pub fn new(repo: Arc<R>, config: SchedulerConfig, shutdown: CancellationToken) -> Self {
        Self {
            repo,
            config,
            shutdown,
            last_minute: None,
        }
    }

    /// 主循环：启动时评估当前分钟 → 周期触发 → 响应 shutdown
    pub async fn run(mut self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            timezone = %self.config.timezone,
            "Store availability scheduler started"
        );

        let shutdown = self.shutdown.clone();
        loop {
            let now = Utc::now();

            tokio::select! {
                _ = self.run_due(now) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Store availability tick interrupted by shutdown");
                    return;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Store availability scheduler received shutdown signal");
                    return;
                }
            }
        }
    }

    /// 评估 `now` 之前所有尚未评估的分钟
    ///
    /// 同一分钟只评估一次；唤醒迟到时按顺序补跑错过的分钟
    /// (最多 `max_catch_up_minutes` 个)。
    pub async fn run_due(&mut self, now: DateTime<Utc>) -> Vec<TickReport> {
        let minutes = pending_minutes(self.last_minute, now, self.config.max_catch_up_minutes);
        let mut reports = Vec::with_capacity(minutes.len());
        for minute in minutes {
            let local = time::business_time(minute, self.config.timezone);
            reports.push(self.tick(local).await);
            self.last_minute = Some(minute);
        }
        reports
    }

    /// 以业务时区的本地时间执行一次 tick
    pub async fn tick(&self, now: NaiveDateTime) -> TickReport {
        let now = truncate_to_minute(now);
        let mut report = TickReport::default();

        match self.repo.find_due_to_close(now).await {
            Ok(stores) => {
                let (closed, failures) = self.apply(stores, Transition::Close).await;
                report.closed = closed;
                report.failures.extend(failures);
            }
            Err(e) => {
                tracing::error!(at = %now, error = %e, "Failed to query stores due to close");
                report.failures.push(TransitionFailure {
                    store_id: None,
                    transition: Transition::Close,
                    error: e.to_string(),
                });
            }
        }

        match self.repo.find_due_to_open(now).await {
            Ok(stores) => {
                let (opened, failures) = self.apply(stores, Transition::Open).await;
                report.opened = opened;
                report.failures.extend(failures);
            }
            Err(e) => {
                tracing::error!(at = %now, error = %e, "Failed to query stores due to open");
                report.failures.push(TransitionFailure {
                    store_id: None,
                    transition: Transition::Open,
                    error: e.to_string(),
                });
            }
        }

        if report.is_empty() {
            tracing::debug!(at = %format_time_of_day(now), "No store transitions due");
        } else {
            tracing::info!(
                at = %format_time_of_day(now),
                closed = report.closed.len(),
                opened = report.opened.len(),
                failed = report.failures.len(),
                "Store availability tick finished"
            );
        }

        report
    }

    /// 以有限并发执行一批开关店，返回 (实际切换的 ID, 失败项)
    async fn apply(
        &self,
        stores: Vec<Store>,
        transition: Transition,
    ) -> (Vec<String>, Vec<TransitionFailure>) {
        let repo = &self.repo;
        let results: Vec<_> = stream::iter(stores.into_iter().map(|store| store.id))
            .map(|store_id| async move {
                let result = match transition {
                    Transition::Close => repo.close(&store_id).await,
                    Transition::Open => repo.open(&store_id).await,
                };
                (store_id, result)
            })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();
        for (store_id, result) in results {
            match result {
                Ok(true) => {
                    tracing::info!(
                        store_id = %store_id,
                        transition = %transition,
                        "Store state changed"
                    );
                    succeeded.push(store_id);
                }
                Ok(false) => {
                    tracing::debug!(
                        store_id = %store_id,
                        transition = %transition,
                        "Store already in target state or gone, skipped"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        store_id = %store_id,
                        transition = %transition,
                        error = %e,
                        "Store state change failed"
                    );
                    failures.push(TransitionFailure {
                        store_id: Some(store_id),
                        transition,
                        error: e.to_string(),
                    });
                }
            }
        }
        succeeded.sort();
        (succeeded, failures)
    }
}

/// 计算需要评估的 UTC 分钟序列 (升序)
///
/// - 首次运行：只评估当前分钟
/// - 当前分钟已评估：不评估
/// - 系统时钟回拨：不评估，等时钟追上最近已评估的分钟
/// - 间隔超过 `max_catch_up` 分钟：只补最近的 `max_catch_up` 分钟
fn pending_minutes(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_catch_up: u32,
) -> Vec<DateTime<Utc>> {
    let current = truncate_to_minute(now);
    let Some(last) = last else {
        return vec![current];
    };

    if current == last {
        return Vec::new();
    }
    if current < last {
        tracing::warn!(
            last = %last,
            now = %current,
            "System clock moved backwards, skipping evaluated minutes"
        );
        return Vec::new();
    }

    let gap = (current - last).num_minutes();
    let limit = i64::from(max_catch_up.max(1));
    if gap > limit {
        tracing::warn!(
            missed = gap - limit,
            last = %last,
            now = %current,
            "Scheduler woke late, some minutes will not be evaluated"
        );
    }

    (0..gap.min(limit))
        .rev()
        .map(|back| current - chrono::Duration::minutes(back))
        .collect()
}

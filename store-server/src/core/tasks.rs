//! 后台任务管理
//!
//! 统一管理后台任务的注册、启动和关闭。所有任务共享一个
//! [`CancellationToken`]，关闭时先取消再在超时内等待任务退出。

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// let scheduler = AvailabilityScheduler::new(repo, config, tasks.shutdown_token());
/// tasks.spawn("store_availability", scheduler.run());
///
/// tasks.shutdown(Duration::from_secs(10)).await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌 (任务内部监听 shutdown 信号)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic；未收到取消信号就退出会记录告警。
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let wrapped_future = async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => {
                    tracing::debug!(task = %name, "Background task stopped");
                }
                Ok(()) => {
                    tracing::warn!(task = %name, "Background task completed unexpectedly");
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(task = %name, panic = %panic_msg, "Background task panicked");
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    pub fn log_summary(&self) {
        let names: Vec<_> = self.tasks.iter().map(|t| t.name).collect();
        tracing::info!(total = names.len(), tasks = ?names, "Background tasks registered");
    }

    /// Graceful shutdown：发送取消信号，在 `timeout` 内等待所有任务退出
    ///
    /// 超时未退出的任务会被 abort。
    pub async fn shutdown(self, timeout: Duration) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            let abort = task.handle.abort_handle();
            match tokio::time::timeout(timeout, task.handle).await {
                Ok(Ok(())) => tracing::debug!(task = %task.name, "Task completed"),
                Ok(Err(e)) if e.is_cancelled() => {
                    tracing::debug!(task = %task.name, "Task cancelled")
                }
                Ok(Err(e)) => tracing::error!(task = %task.name, error = ?e, "Task failed"),
                Err(_) => {
                    tracing::warn!(
                        task = %task.name,
                        timeout_ms = timeout.as_millis() as u64,
                        "Task did not stop in time, aborting"
                    );
                    abort.abort();
                }
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

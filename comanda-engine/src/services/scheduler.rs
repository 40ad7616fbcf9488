//! 定时任务调度器
//!
//! 显式的调度器值：先 [`Scheduler::register`] 注册任务，再
//! [`Scheduler::start`] 启动，关闭时 [`Scheduler::shutdown`] 等待所有
//! 任务退出。调度节奏由配置决定，任务体经过 [`run_job`]
//! 包装，单个任务失败不影响其它任务。

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppResult;
use crate::core::tasks::run_job;

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, AppResult<u64>> + Send + Sync>;

struct RegisteredJob {
    name: &'static str,
    every: Duration,
    job: JobFn,
}

/// 定时任务调度器
///
/// # 使用示例
///
/// ```ignore
/// let mut scheduler = Scheduler::new();
/// scheduler.register("redemption_sweep", Duration::from_secs(60), move || {
///     let sweeper = sweeper.clone();
///     async move { sweeper.expire_stale_redemptions().await }
/// });
/// scheduler.start();
/// // ...
/// scheduler.shutdown().await;
/// ```
pub struct Scheduler {
    jobs: Vec<RegisteredJob>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（用于外部触发关闭）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册一个定时任务（在 [`start`](Self::start) 之前调用）
    pub fn register<F, Fut>(&mut self, name: &'static str, every: Duration, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<u64>> + Send + 'static,
    {
        self.jobs.push(RegisteredJob {
            name,
            every,
            job: Arc::new(move || Box::pin(job())),
        });
        tracing::debug!(task = %name, every_secs = every.as_secs(), "Registered scheduled task");
    }

    /// 启动所有已注册任务
    ///
    /// 每个任务第一次在启动时立即执行（追赶积压），之后按注册的
    /// 周期执行。错过的 tick 被跳过而不是补齐。
    pub fn start(&mut self) {
        for registered in self.jobs.drain(..) {
            let shutdown = self.shutdown.clone();
            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(registered.every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            run_job(registered.name, || (registered.job)()).await;
                        }
                    }
                }
                tracing::debug!(task = %registered.name, "Scheduled task loop stopped");
            });
            self.handles.push((registered.name, handle));
        }
        tracing::info!(
            "Scheduler started: {} periodic task(s)",
            self.handles.len()
        );
    }

    /// 触发关闭并等待所有任务退出（每个任务最多等待 5s）
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for (name, handle) in self.handles.drain(..) {
            if tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                tracing::warn!(task = %name, "Scheduled task did not stop within timeout");
            }
        }
        tracing::info!("Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

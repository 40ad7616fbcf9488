//! 定时任务隔离封装
//!
//! 每个定时任务的单次执行都经过 [`run_job`] 包装：记录开始/结束日志，
//! 捕获错误和 panic。单个任务失败不会影响兄弟任务的调度，也不会
//! 导致进程退出。

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::error::AppResult;

/// 执行一次定时任务
///
/// - 正常完成：记录 debug 日志（带影响行数）
/// - 返回错误：记录 error 日志，不向调度器传播
/// - panic：捕获并记录 error 日志，不向调度器传播
pub async fn run_job<F, Fut>(name: &'static str, job: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<u64>>,
{
    tracing::debug!(task = %name, "Scheduled task started");

    let result: Result<AppResult<u64>, Box<dyn std::any::Any + Send>> =
        AssertUnwindSafe(job()).catch_unwind().await;

    match result {
        Ok(Ok(affected)) => {
            tracing::debug!(task = %name, affected, "Scheduled task completed");
        }
        Ok(Err(e)) => {
            tracing::error!(task = %name, error = %e, "Scheduled task failed");
        }
        Err(panic_info) => {
            let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            tracing::error!(
                task = %name,
                panic = %panic_msg,
                "Scheduled task panicked! This is a bug that should be reported."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;

    #[tokio::test]
    async fn run_job_passes_through_success() {
        // Nothing to assert beyond "does not panic / does not hang".
        run_job("ok_task", || async { Ok(3) }).await;
    }

    #[tokio::test]
    async fn run_job_swallows_errors() {
        run_job("failing_task", || async {
            Err(AppError::database("store unavailable"))
        })
        .await;
    }

    #[tokio::test]
    async fn run_job_swallows_panics() {
        run_job("panicking_task", || async {
            panic!("tick gone wrong");
            #[allow(unreachable_code)]
            Ok(0)
        })
        .await;
        // Reaching this line means the panic did not unwind past the harness.
    }
}

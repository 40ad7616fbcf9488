use std::time::Duration;

use comanda_engine::{Config, DbService, ExpirySweeper, Scheduler, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), None);

    tracing::info!(environment = %config.environment, "Comanda engine starting...");

    // 2. 打开数据库
    std::fs::create_dir_all(&config.work_dir)?;
    let db = DbService::new(&config.db_path()).await?;

    // 3. 注册并启动定时清扫任务
    let sweeper = ExpirySweeper::new(db.pool.clone());
    let mut scheduler = Scheduler::new();

    {
        let sweeper = sweeper.clone();
        scheduler.register(
            "redemption_sweep",
            Duration::from_secs(config.redemption_sweep_secs),
            move || {
                let sweeper = sweeper.clone();
                async move { sweeper.expire_stale_redemptions().await }
            },
        );
    }
    {
        let sweeper = sweeper.clone();
        scheduler.register(
            "order_sweep",
            Duration::from_secs(config.order_sweep_secs),
            move || {
                let sweeper = sweeper.clone();
                async move { sweeper.delete_stale_orders().await }
            },
        );
    }
    scheduler.start();

    // 4. 等待关闭信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    scheduler.shutdown().await;

    Ok(())
}

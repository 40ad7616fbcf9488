/// 引擎配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/comanda | 工作目录（数据库文件所在） |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | REDEMPTION_SWEEP_SECS | 60 | 兑换券过期扫描周期（秒） |
/// | ORDER_SWEEP_SECS | 300 | 预订单清理扫描周期（秒） |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/comanda REDEMPTION_SWEEP_SECS=30 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 兑换券过期扫描周期（秒）
    pub redemption_sweep_secs: u64,
    /// 预订单清理扫描周期（秒）
    pub order_sweep_secs: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/comanda".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            redemption_sweep_secs: std::env::var("REDEMPTION_SWEEP_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            order_sweep_secs: std::env::var("ORDER_SWEEP_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
        }
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> String {
        format!("{}/comanda.db", self.work_dir)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/comanda".into(),
            environment: "development".into(),
            log_level: "info".into(),
            redemption_sweep_secs: 60,
            order_sweep_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadences() {
        let config = Config::default();
        assert_eq!(config.redemption_sweep_secs, 60);
        assert_eq!(config.order_sweep_secs, 300);
        assert!(!config.is_production());
        assert_eq!(config.db_path(), "/var/lib/comanda/comanda.db");
    }
}

//! Comanda Engine - 餐厅积分与票据引擎
//!
//! # 架构概述
//!
//! 本 crate 是餐厅运营平台的事务核心，提供以下功能：
//!
//! - **积分账本** (`loyalty::ledger`): (顾客, 餐厅) 维度的原子余额变更，余额永不为负
//! - **短码分配** (`loyalty::codes`): 带唯一性校验的 6 位数字码
//! - **兑换券状态机** (`loyalty::redemption`): active → activated → completed/expired
//! - **预订单状态机** (`preorders`): pending → preparing → ready → completed/cancelled
//! - **过期清扫** (`services::sweeper`): 周期性强制过期/清理超窗票据
//! - **任务调度** (`services::scheduler`): 带故障隔离的定时任务
//!
//! HTTP 路由、认证、图片存储、邮件和 UI 均为外部协作方，不在本 crate 内。
//!
//! # 模块结构
//!
//! ```text
//! comanda-engine/src/
//! ├── core/          # 配置、错误、任务封装
//! ├── db/            # SQLite 连接池、模型、repository
//! ├── loyalty/       # 积分账本、短码、兑换券
//! ├── preorders/     # 预订单状态机
//! ├── services/      # 清扫器、调度器
//! └── utils/         # 日志、时间与 ID
//! ```

pub mod core;
pub mod db;
pub mod loyalty;
pub mod preorders;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use self::core::{AppError, AppResult, Config, run_job};
pub use db::DbService;
pub use loyalty::{ACTIVATION_WINDOW_MS, CodeAllocator, CodeScope, PointsLedger, RedemptionService};
pub use preorders::{PENDING_ORDER_TTL_MS, PreorderService};
pub use services::{ExpirySweeper, Scheduler};

// Re-export logger functions
pub use utils::{init_logger, init_logger_with_file};

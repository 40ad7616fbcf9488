//! 核心模块 - 配置、错误和后台任务封装
//!
//! # 模块结构
//!
//! - [`Config`] - 引擎配置
//! - [`AppError`] - 应用错误枚举
//! - [`run_job`] - 定时任务隔离封装

pub mod config;
pub mod error;
pub mod tasks;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use tasks::run_job;

//! 后台服务
//!
//! - [`ExpirySweeper`] - 周期性清理过期票据
//! - [`Scheduler`] - 定时任务调度器

pub mod scheduler;
pub mod sweeper;

pub use scheduler::Scheduler;
pub use sweeper::ExpirySweeper;

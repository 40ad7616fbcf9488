//! 积分与兑换模块
//!
//! - [`PointsLedger`] - 积分账本，原子余额变更
//! - [`CodeAllocator`] - 短码分配器
//! - [`RedemptionService`] - 兑换券状态机

pub mod codes;
pub mod ledger;
pub mod redemption;

pub use codes::{CodeAllocator, CodeScope};
pub use ledger::PointsLedger;
pub use redemption::{ACTIVATION_WINDOW_MS, RedemptionService};

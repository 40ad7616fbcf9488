//! Persisted Record Models

pub mod balance;
pub mod preorder;
pub mod redemption;
pub mod reward;

pub use balance::PointsBalance;
pub use preorder::{
    LineItemPatch, LineQuantityUpdate, OrderLine, Preorder, PreorderStatus, order_total,
};
pub use redemption::{RedemptionStatus, RedemptionTicket};
pub use reward::RewardItem;

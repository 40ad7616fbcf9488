//! Points Balance Model

use serde::{Deserialize, Serialize};

/// Points balance entity (积分余额)
///
/// One row per (customer, restaurant) pair. The single source of truth
/// for spendable points; `points >= 0` is enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointsBalance {
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub points: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

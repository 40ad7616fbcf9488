//! Reward Catalog Model

use serde::{Deserialize, Serialize};

/// Reward item entity (奖励商品)
///
/// Supplied by the catalog collaborator. This engine reads it and
/// performs the atomic stock decrement during redemption; everything
/// else about the catalog is managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RewardItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub description: String,
    pub category: String,
    pub points_required: i64,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

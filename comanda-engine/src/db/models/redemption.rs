//! Redemption Ticket Model

use serde::{Deserialize, Serialize};

/// Redemption ticket lifecycle
///
/// `active → activated → completed`, with `activated → expired` forced
/// by the sweeper. Terminal states are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Active,
    Activated,
    Completed,
    Expired,
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RedemptionStatus::Active => "active",
            RedemptionStatus::Activated => "activated",
            RedemptionStatus::Completed => "completed",
            RedemptionStatus::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Redemption ticket entity (兑换券)
///
/// The item fields are an immutable snapshot taken at redemption time,
/// so later catalog edits cannot change what was claimed.
/// `code` is non-null only while `activated`, and globally unique while
/// non-null.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RedemptionTicket {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    // -- Item snapshot --
    pub item_id: i64,
    pub item_description: String,
    pub item_category: String,
    pub points_required: i64,
    // -- Lifecycle --
    pub status: RedemptionStatus,
    pub code: Option<String>,
    pub redeemed_at: i64,
    pub activated_at: Option<i64>,
    pub used_at: Option<i64>,
}

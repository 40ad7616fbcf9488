//! Preorder Model

use serde::{Deserialize, Serialize};

/// Preorder lifecycle
///
/// `pending → preparing → ready → completed/cancelled`, strictly
/// forward. `code` is non-null only while `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PreorderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl PreorderStatus {
    /// Transition ordering. `completed` and `cancelled` share the
    /// terminal rank so neither can be reached from the other.
    pub fn rank(self) -> u8 {
        match self {
            PreorderStatus::Pending => 0,
            PreorderStatus::Preparing => 1,
            PreorderStatus::Ready => 2,
            PreorderStatus::Completed | PreorderStatus::Cancelled => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PreorderStatus::Completed | PreorderStatus::Cancelled)
    }
}

impl std::fmt::Display for PreorderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PreorderStatus::Pending => "pending",
            PreorderStatus::Preparing => "preparing",
            PreorderStatus::Ready => "ready",
            PreorderStatus::Completed => "completed",
            PreorderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// One line of a preorder — a snapshot of the menu item at submission
/// time (price changes after the fact do not reprice the order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Line-item patch payload: add / update quantity / remove, all by item id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemPatch {
    #[serde(default)]
    pub add: Vec<OrderLine>,
    #[serde(default)]
    pub update: Vec<LineQuantityUpdate>,
    #[serde(default)]
    pub remove: Vec<i64>,
}

/// Quantity update for an existing line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineQuantityUpdate {
    pub item_id: i64,
    pub quantity: i32,
}

/// Preorder entity (预订单)
///
/// Line items are stored as a JSON blob; `total` is recomputed from the
/// lines on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Preorder {
    pub id: i64,
    pub restaurant_id: i64,
    pub customer_id: i64,
    pub code: Option<String>,
    pub table_number: Option<i64>,
    /// JSON-encoded `Vec<OrderLine>`
    pub items: String,
    pub total: f64,
    pub status: PreorderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Preorder {
    /// Decode the line-item JSON blob
    pub fn lines(&self) -> serde_json::Result<Vec<OrderLine>> {
        serde_json::from_str(&self.items)
    }
}

/// `total == Σ(price × quantity)`
pub fn order_total(lines: &[OrderLine]) -> f64 {
    lines
        .iter()
        .map(|l| l.price * f64::from(l.quantity))
        .sum()
}

//! Points Ledger
//!
//! Atomic balance mutation for a (customer, restaurant) pair. Both
//! paths are single conditional statements at the store — there is no
//! read-then-write in application code, so two concurrent debits can
//! never jointly drive a balance negative.

use sqlx::SqlitePool;

use crate::core::error::AppResult;
use crate::db::repository::points;
use crate::utils::now_millis;

#[derive(Clone)]
pub struct PointsLedger {
    pool: SqlitePool,
}

impl PointsLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply `change` (positive = credit, negative = debit) to the pair's
    /// balance.
    ///
    /// - Credit with no existing row: creates it with `points = change`.
    /// - Debit with no existing row: nothing to debit, `Ok(false)`, no
    ///   row created.
    /// - Debit that would go below zero: rejected, `Ok(false)`.
    ///
    /// Insufficient balance is a normal outcome, not a fault.
    pub async fn adjust_points(
        &self,
        change: i64,
        restaurant_id: i64,
        customer_id: i64,
    ) -> AppResult<bool> {
        let now = now_millis();
        if change >= 0 {
            points::credit_or_create(&self.pool, customer_id, restaurant_id, change, now).await?;
            Ok(true)
        } else {
            let applied =
                points::try_debit(&self.pool, customer_id, restaurant_id, -change, now).await?;
            Ok(applied)
        }
    }

    /// Current spendable points (0 when the pair has no row yet)
    pub async fn balance(&self, restaurant_id: i64, customer_id: i64) -> AppResult<i64> {
        let row = points::find(&self.pool, customer_id, restaurant_id).await?;
        Ok(row.map(|b| b.points).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    const R: i64 = 7;
    const C: i64 = 42;

    async fn ledger() -> PointsLedger {
        let db = DbService::open_in_memory().await.unwrap();
        PointsLedger::new(db.pool)
    }

    async fn row_count(ledger: &PointsLedger) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM points_balance")
            .fetch_one(&ledger.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn credit_on_empty_balance_creates_row() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(50, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn debit_on_empty_balance_is_rejected_without_creating_row() {
        let ledger = ledger().await;
        assert!(!ledger.adjust_points(-20, R, C).await.unwrap());
        assert_eq!(row_count(&ledger).await, 0);
        assert_eq!(ledger.balance(R, C).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn credits_accumulate() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(30, R, C).await.unwrap());
        assert!(ledger.adjust_points(20, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn debit_within_balance_applies() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(40, R, C).await.unwrap());
        assert!(ledger.adjust_points(-15, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_and_balance_unchanged() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(10, R, C).await.unwrap());
        assert!(!ledger.adjust_points(-20, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn pairs_are_independent() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(10, R, C).await.unwrap());
        assert!(ledger.adjust_points(99, R + 1, C).await.unwrap());
        assert!(!ledger.adjust_points(-11, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 10);
        assert_eq!(ledger.balance(R + 1, C).await.unwrap(), 99);
    }

    #[tokio::test]
    async fn zero_change_counts_as_credit() {
        let ledger = ledger().await;
        assert!(ledger.adjust_points(0, R, C).await.unwrap());
        assert_eq!(ledger.balance(R, C).await.unwrap(), 0);
        // A zero credit still creates the row, matching the `change >= 0` contract.
        assert_eq!(row_count(&ledger).await, 1);
    }
}

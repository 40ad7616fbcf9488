//! Reward Catalog Repository
//!
//! The catalog itself is owned by an external collaborator; this engine
//! only reads items and moves stock during redemption.

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::RewardItem;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RewardItem>> {
    let row = sqlx::query_as::<_, RewardItem>(
        "SELECT id, restaurant_id, description, category, points_required, stock, is_active, created_at, updated_at FROM reward_item WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Take one unit of stock. The `stock > 0` predicate makes two
/// concurrent redemptions of the last unit impossible: exactly one
/// UPDATE matches.
pub async fn decrement_stock(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE reward_item SET stock = stock - 1, updated_at = ?1 WHERE id = ?2 AND stock > 0",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Compensating action for a failed redemption: hand the unit back.
pub async fn restore_stock(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE reward_item SET stock = stock + 1, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

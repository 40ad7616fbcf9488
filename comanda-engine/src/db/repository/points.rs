//! Points Balance Repository

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::PointsBalance;

/// Credit `amount` points, creating the balance row lazily.
///
/// Single atomic upsert: concurrent credits serialize at the store.
pub async fn credit_or_create(
    pool: &SqlitePool,
    customer_id: i64,
    restaurant_id: i64,
    amount: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO points_balance (customer_id, restaurant_id, points, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4) ON CONFLICT(customer_id, restaurant_id) DO UPDATE SET points = points + excluded.points, updated_at = excluded.updated_at",
    )
    .bind(customer_id)
    .bind(restaurant_id)
    .bind(amount)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Debit `amount` points with the floor-at-zero predicate in the WHERE
/// clause. Returns `false` when no row exists or the debit would drive
/// the balance negative — in either case nothing is written and no row
/// is created.
pub async fn try_debit(
    pool: &SqlitePool,
    customer_id: i64,
    restaurant_id: i64,
    amount: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE points_balance SET points = points - ?1, updated_at = ?2 WHERE customer_id = ?3 AND restaurant_id = ?4 AND points - ?1 >= 0",
    )
    .bind(amount)
    .bind(now)
    .bind(customer_id)
    .bind(restaurant_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find(
    pool: &SqlitePool,
    customer_id: i64,
    restaurant_id: i64,
) -> RepoResult<Option<PointsBalance>> {
    let row = sqlx::query_as::<_, PointsBalance>(
        "SELECT customer_id, restaurant_id, points, created_at, updated_at FROM points_balance WHERE customer_id = ? AND restaurant_id = ?",
    )
    .bind(customer_id)
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

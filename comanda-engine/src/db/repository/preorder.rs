//! Preorder Repository

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::{Preorder, PreorderStatus};

const PREORDER_SELECT: &str = "SELECT id, restaurant_id, customer_id, code, table_number, items, total, status, created_at, updated_at FROM preorder";

pub async fn insert(pool: &SqlitePool, order: &Preorder) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO preorder (id, restaurant_id, customer_id, code, table_number, items, total, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(order.id)
    .bind(order.restaurant_id)
    .bind(order.customer_id)
    .bind(&order.code)
    .bind(order.table_number)
    .bind(&order.items)
    .bind(order.total)
    .bind(order.status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Preorder>> {
    let sql = format!("{PREORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Preorder>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Lookup by live code within one restaurant (per-restaurant scope).
pub async fn find_by_code(
    pool: &SqlitePool,
    restaurant_id: i64,
    code: &str,
) -> RepoResult<Option<Preorder>> {
    let sql = format!("{PREORDER_SELECT} WHERE restaurant_id = ? AND code = ?");
    let row = sqlx::query_as::<_, Preorder>(&sql)
        .bind(restaurant_id)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Is this code live on any order of the restaurant?
pub async fn code_in_use(pool: &SqlitePool, restaurant_id: i64, code: &str) -> RepoResult<bool> {
    let n: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM preorder WHERE restaurant_id = ? AND code = ?)",
    )
    .bind(restaurant_id)
    .bind(code)
    .fetch_one(pool)
    .await?;
    Ok(n != 0)
}

/// First staff interaction: `pending → preparing`, table assigned,
/// code released. 0 rows affected means missing or already past pending.
pub async fn assign_table(
    pool: &SqlitePool,
    id: i64,
    table_number: i64,
    now: i64,
) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE preorder SET status = 'preparing', table_number = ?1, code = NULL, updated_at = ?2 WHERE id = ?3 AND status = 'pending'",
    )
    .bind(table_number)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Compare-and-swap status transition. The expected current status sits
/// in the WHERE clause, so a concurrent transition makes this a no-op
/// (0 rows) instead of a lost update. The code is released the moment
/// the order leaves `pending` (it was already NULL otherwise).
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: PreorderStatus,
    to: PreorderStatus,
    now: i64,
) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE preorder SET status = ?1, code = NULL, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Write back patched line items with an optimistic `updated_at` check;
/// 0 rows affected means the order changed underneath the caller.
pub async fn replace_lines(
    pool: &SqlitePool,
    id: i64,
    items_json: &str,
    total: f64,
    expected_updated_at: i64,
    now: i64,
) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE preorder SET items = ?1, total = ?2, updated_at = ?3 WHERE id = ?4 AND updated_at = ?5",
    )
    .bind(items_json)
    .bind(total)
    .bind(now)
    .bind(id)
    .bind(expected_updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Bulk sweep: hard-delete orders nobody claimed. Self-limiting filter,
/// safe to re-run concurrently.
pub async fn delete_pending_older_than(pool: &SqlitePool, cutoff: i64) -> RepoResult<u64> {
    let result =
        sqlx::query("DELETE FROM preorder WHERE status = 'pending' AND created_at <= ?1")
            .bind(cutoff)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

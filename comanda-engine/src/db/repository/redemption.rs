//! Redemption Ticket Repository

use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::RedemptionTicket;

const TICKET_SELECT: &str = "SELECT id, customer_id, restaurant_id, item_id, item_description, item_category, points_required, status, code, redeemed_at, activated_at, used_at FROM redemption_ticket";

pub async fn insert(pool: &SqlitePool, ticket: &RedemptionTicket) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO redemption_ticket (id, customer_id, restaurant_id, item_id, item_description, item_category, points_required, status, code, redeemed_at, activated_at, used_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(ticket.id)
    .bind(ticket.customer_id)
    .bind(ticket.restaurant_id)
    .bind(ticket.item_id)
    .bind(&ticket.item_description)
    .bind(&ticket.item_category)
    .bind(ticket.points_required)
    .bind(ticket.status)
    .bind(&ticket.code)
    .bind(ticket.redeemed_at)
    .bind(ticket.activated_at)
    .bind(ticket.used_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RedemptionTicket>> {
    let sql = format!("{TICKET_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, RedemptionTicket>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Lookup by live code. Completed/expired tickets have `code = NULL`
/// and can never match.
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<RedemptionTicket>> {
    let sql = format!("{TICKET_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, RedemptionTicket>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Is this code live on any ticket? (global uniqueness scope)
pub async fn code_in_use(pool: &SqlitePool, code: &str) -> RepoResult<bool> {
    let n: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM redemption_ticket WHERE code = ?)")
            .bind(code)
            .fetch_one(pool)
            .await?;
    Ok(n != 0)
}

/// `active → activated`: assigns the code and stamps `activated_at`.
/// 0 rows affected means the ticket is missing or not `active`.
/// A unique violation on the code index surfaces as `RepoError::Duplicate`.
pub async fn mark_activated(
    pool: &SqlitePool,
    id: i64,
    code: &str,
    now: i64,
) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE redemption_ticket SET status = 'activated', code = ?1, activated_at = ?2 WHERE id = ?3 AND status = 'active'",
    )
    .bind(code)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// `activated → completed`: stamps `used_at` and clears the code.
/// Conditional on `activated` so a concurrent sweep cannot be undone.
pub async fn mark_completed(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE redemption_ticket SET status = 'completed', used_at = ?1, code = NULL WHERE id = ?2 AND status = 'activated'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// `activated → expired`: clears the code. No-op on any other status,
/// which is what makes the sweeper idempotent.
pub async fn mark_expired(pool: &SqlitePool, id: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE redemption_ticket SET status = 'expired', code = NULL WHERE id = ?1 AND status = 'activated'",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Bulk sweep: expire every activated ticket whose window closed at or
/// before `cutoff`. Already-transitioned rows no longer match the
/// filter, so overlapping sweeps are harmless.
pub async fn expire_older_than(pool: &SqlitePool, cutoff: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE redemption_ticket SET status = 'expired', code = NULL WHERE status = 'activated' AND activated_at <= ?1",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

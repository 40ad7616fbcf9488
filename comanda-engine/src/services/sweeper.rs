//! Expiry Sweeper
//!
//! Periodic reaper for tickets past their time window. Each sweep is a
//! single conditional bulk statement whose filter is self-limiting:
//! rows that already transitioned no longer match, so overlapping runs
//! and races with live request traffic are harmless.

use sqlx::SqlitePool;

use crate::core::error::AppResult;
use crate::db::repository::{preorder, redemption};
use crate::loyalty::redemption::ACTIVATION_WINDOW_MS;
use crate::preorders::PENDING_ORDER_TTL_MS;
use crate::utils::now_millis;

#[derive(Clone)]
pub struct ExpirySweeper {
    pool: SqlitePool,
}

impl ExpirySweeper {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Force `activated → expired` on every redemption ticket whose
    /// 15-minute window has elapsed; clears their codes. Returns the
    /// number of tickets swept.
    pub async fn expire_stale_redemptions(&self) -> AppResult<u64> {
        let cutoff = now_millis() - ACTIVATION_WINDOW_MS;
        let count = redemption::expire_older_than(&self.pool, cutoff).await?;
        if count > 0 {
            tracing::info!(count, "Stale redemption tickets expired");
        }
        Ok(count)
    }

    /// Hard-delete preorders still `pending` 30 minutes after creation.
    /// Returns the number of orders removed.
    pub async fn delete_stale_orders(&self) -> AppResult<u64> {
        let cutoff = now_millis() - PENDING_ORDER_TTL_MS;
        let count = preorder::delete_pending_older_than(&self.pool, cutoff).await?;
        if count > 0 {
            tracing::info!(count, "Stale pending preorders deleted");
        }
        Ok(count)
    }
}

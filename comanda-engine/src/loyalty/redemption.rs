//! Redemption State Machine
//!
//! `active → activated → completed`, with `activated → expired` forced
//! by the sweeper once the activation window closes. Every transition
//! is a conditional single-row update; a ticket that is already
//! completed or expired can never move again.

use sqlx::SqlitePool;

use crate::core::error::{AppError, AppResult};
use crate::db::models::{RedemptionStatus, RedemptionTicket, RewardItem};
use crate::db::repository::{RepoError, redemption, reward};
use crate::loyalty::codes::{CODE_ATTEMPTS, CodeAllocator, CodeScope};
use crate::loyalty::ledger::PointsLedger;
use crate::utils::{now_millis, snowflake_id};

/// 激活窗口：激活后 15 分钟内有效
pub const ACTIVATION_WINDOW_MS: i64 = 15 * 60 * 1000;

#[derive(Clone)]
pub struct RedemptionService {
    pool: SqlitePool,
    ledger: PointsLedger,
    codes: CodeAllocator,
}

impl RedemptionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            ledger: PointsLedger::new(pool.clone()),
            codes: CodeAllocator::new(pool.clone()),
            pool,
        }
    }

    /// Claim a reward item: checks catalog and stock, debits the points,
    /// takes one unit of stock, and creates an `active` ticket carrying
    /// an immutable snapshot of the item.
    ///
    /// The debit and the stock decrement are independent atomic writes.
    /// If the stock decrement loses the race for the last unit, the
    /// points are credited back and the whole operation fails; a failed
    /// ticket insert likewise restores both stock and points.
    pub async fn redeem(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        reward_item_id: i64,
    ) -> AppResult<RedemptionTicket> {
        let item = reward::find_by_id(&self.pool, reward_item_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::not_found(format!("reward item {reward_item_id}")))?;
        self.redeem_item(customer_id, restaurant_id, &item).await
    }

    /// Inner redeem against an already-fetched catalog snapshot. The
    /// snapshot may be stale by the time the stock decrement runs, which
    /// is exactly the race the compensation path covers.
    async fn redeem_item(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        item: &RewardItem,
    ) -> AppResult<RedemptionTicket> {
        if item.stock <= 0 {
            return Err(AppError::OutOfStock);
        }

        if !self
            .ledger
            .adjust_points(-item.points_required, restaurant_id, customer_id)
            .await?
        {
            return Err(AppError::InsufficientBalance);
        }

        let now = now_millis();
        if !reward::decrement_stock(&self.pool, item.id, now).await? {
            // A concurrent redemption took the last unit between our
            // stock check and this write. Hand the points back.
            self.compensate_points(item, restaurant_id, customer_id).await;
            return Err(AppError::OutOfStock);
        }

        let ticket = RedemptionTicket {
            id: snowflake_id(),
            customer_id,
            restaurant_id,
            item_id: item.id,
            item_description: item.description.clone(),
            item_category: item.category.clone(),
            points_required: item.points_required,
            status: RedemptionStatus::Active,
            code: None,
            redeemed_at: now,
            activated_at: None,
            used_at: None,
        };

        if let Err(e) = redemption::insert(&self.pool, &ticket).await {
            if let Err(comp) = reward::restore_stock(&self.pool, item.id, now_millis()).await {
                tracing::error!(
                    item_id = item.id,
                    error = %comp,
                    "Failed to restore stock after ticket insert failure"
                );
            }
            self.compensate_points(item, restaurant_id, customer_id).await;
            return Err(e.into());
        }

        tracing::info!(
            ticket_id = ticket.id,
            customer_id,
            restaurant_id,
            item_id = item.id,
            points = item.points_required,
            "Reward redeemed"
        );
        Ok(ticket)
    }

    async fn compensate_points(&self, item: &RewardItem, restaurant_id: i64, customer_id: i64) {
        if let Err(e) = self
            .ledger
            .adjust_points(item.points_required, restaurant_id, customer_id)
            .await
        {
            tracing::error!(
                customer_id,
                restaurant_id,
                points = item.points_required,
                error = %e,
                "Failed to credit points back after redemption failure"
            );
        }
    }

    /// `active → activated`: allocates a globally unique code and stamps
    /// `activated_at`. Retries the write on a unique-index collision.
    pub async fn activate(&self, ticket_id: i64) -> AppResult<RedemptionTicket> {
        for _ in 0..CODE_ATTEMPTS {
            let code = self.codes.allocate(CodeScope::Global).await?;
            match redemption::mark_activated(&self.pool, ticket_id, &code, now_millis()).await {
                Ok(1) => {
                    tracing::info!(ticket_id, code = %code, "Redemption ticket activated");
                    return self.require_ticket(ticket_id).await;
                }
                Ok(_) => {
                    return match redemption::find_by_id(&self.pool, ticket_id).await? {
                        None => Err(AppError::not_found(format!("ticket {ticket_id}"))),
                        Some(t) => Err(AppError::invalid_state(format!(
                            "cannot activate ticket in status {}",
                            t.status
                        ))),
                    };
                }
                // Another writer claimed the same code between the
                // allocator's check and this update; draw again.
                Err(RepoError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::CodesExhausted(CODE_ATTEMPTS))
    }

    /// Staff finalizes a ticket by its code.
    ///
    /// The window re-check is deliberately redundant with the sweeper:
    /// it closes the gap between sweep ticks, so a ticket activated
    /// 16 minutes ago is rejected even if the sweeper has not run yet.
    pub async fn complete(
        &self,
        code: &str,
        staff_restaurant_id: i64,
    ) -> AppResult<RedemptionTicket> {
        let ticket = redemption::find_by_code(&self.pool, code)
            .await?
            .ok_or(AppError::InvalidCode)?;

        if ticket.restaurant_id != staff_restaurant_id {
            return Err(AppError::forbidden(
                "ticket belongs to a different restaurant",
            ));
        }

        // A live code implies an activated ticket; missing stamp would
        // mean the store broke its own invariant.
        let activated_at = ticket.activated_at.ok_or_else(|| {
            AppError::internal(format!("ticket {} has a code but no activated_at", ticket.id))
        })?;

        let now = now_millis();
        if now - activated_at > ACTIVATION_WINDOW_MS {
            return Err(AppError::Expired);
        }

        if redemption::mark_completed(&self.pool, ticket.id, now).await? == 0 {
            // The sweeper (or another staff client) got there first.
            return Err(AppError::Expired);
        }

        tracing::info!(ticket_id = ticket.id, "Redemption ticket completed");
        self.require_ticket(ticket.id).await
    }

    /// Sweeper entry point: force `activated → expired`. Idempotent —
    /// unknown, completed or already-expired tickets are a no-op and
    /// return `false`.
    pub async fn expire(&self, ticket_id: i64) -> AppResult<bool> {
        Ok(redemption::mark_expired(&self.pool, ticket_id).await? == 1)
    }

    pub async fn find_ticket(&self, ticket_id: i64) -> AppResult<Option<RedemptionTicket>> {
        Ok(redemption::find_by_id(&self.pool, ticket_id).await?)
    }

    async fn require_ticket(&self, ticket_id: i64) -> AppResult<RedemptionTicket> {
        redemption::find_by_id(&self.pool, ticket_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("ticket {ticket_id} vanished")))
    }
}

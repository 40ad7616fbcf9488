//! Preorder State Machine
//!
//! `pending → preparing → ready → completed/cancelled`, strictly
//! forward; the pickup code lives only while the order is `pending`.
//! Orders nobody claims within 30 minutes are reaped by the sweeper.

use sqlx::SqlitePool;

use crate::core::error::{AppError, AppResult};
use crate::db::models::{LineItemPatch, OrderLine, Preorder, PreorderStatus, order_total};
use crate::db::repository::{RepoError, preorder};
use crate::loyalty::codes::{CODE_ATTEMPTS, CodeAllocator, CodeScope};
use crate::utils::{now_millis, snowflake_id};

/// 待处理预订单保留 30 分钟
pub const PENDING_ORDER_TTL_MS: i64 = 30 * 60 * 1000;

/// Bounded retries for the optimistic line-item patch
const PATCH_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct PreorderService {
    pool: SqlitePool,
    codes: CodeAllocator,
}

impl PreorderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            codes: CodeAllocator::new(pool.clone()),
            pool,
        }
    }

    /// Submit a preorder: computes the total from the line snapshots,
    /// allocates a restaurant-scoped pickup code, persists as `pending`.
    pub async fn create(
        &self,
        customer_id: i64,
        restaurant_id: i64,
        items: Vec<OrderLine>,
    ) -> AppResult<Preorder> {
        if items.is_empty() {
            return Err(AppError::validation("preorder needs at least one line item"));
        }
        for line in &items {
            if line.quantity <= 0 {
                return Err(AppError::validation(format!(
                    "line item {} has non-positive quantity",
                    line.item_id
                )));
            }
            if line.price < 0.0 {
                return Err(AppError::validation(format!(
                    "line item {} has negative price",
                    line.item_id
                )));
            }
        }

        let total = order_total(&items);
        let items_json = serde_json::to_string(&items)
            .map_err(|e| AppError::internal(format!("failed to encode line items: {e}")))?;

        for _ in 0..CODE_ATTEMPTS {
            let code = self
                .codes
                .allocate(CodeScope::Restaurant(restaurant_id))
                .await?;
            let now = now_millis();
            let order = Preorder {
                id: snowflake_id(),
                restaurant_id,
                customer_id,
                code: Some(code),
                table_number: None,
                items: items_json.clone(),
                total,
                status: PreorderStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            match preorder::insert(&self.pool, &order).await {
                Ok(()) => {
                    tracing::info!(
                        order_id = order.id,
                        restaurant_id,
                        customer_id,
                        total,
                        "Preorder created"
                    );
                    return Ok(order);
                }
                // Unique index beat the allocator's pre-check; new code.
                Err(RepoError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::CodesExhausted(CODE_ATTEMPTS))
    }

    /// First staff interaction: assign a table, which implicitly moves
    /// the order `pending → preparing` and releases its code.
    pub async fn assign_table(&self, order_id: i64, table_number: i64) -> AppResult<Preorder> {
        if preorder::assign_table(&self.pool, order_id, table_number, now_millis()).await? == 0 {
            return match preorder::find_by_id(&self.pool, order_id).await? {
                None => Err(AppError::not_found(format!("preorder {order_id}"))),
                Some(o) => Err(AppError::invalid_state(format!(
                    "cannot assign a table to an order in status {}",
                    o.status
                ))),
            };
        }
        tracing::info!(order_id, table_number, "Preorder moved to preparing");
        self.require_order(order_id).await
    }

    /// Staff-driven forward transition. Backward or sideways moves are
    /// rejected; the compare-and-swap on the current status turns a
    /// concurrent transition into an `InvalidState` instead of a lost
    /// update.
    pub async fn set_status(&self, order_id: i64, status: PreorderStatus) -> AppResult<Preorder> {
        let current = preorder::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("preorder {order_id}")))?;

        if status.rank() <= current.status.rank() {
            return Err(AppError::invalid_state(format!(
                "cannot move order from {} to {}",
                current.status, status
            )));
        }

        if preorder::transition_status(&self.pool, order_id, current.status, status, now_millis())
            .await?
            == 0
        {
            return Err(AppError::invalid_state(
                "order was transitioned concurrently",
            ));
        }

        tracing::info!(order_id, status = %status, "Preorder status changed");
        self.require_order(order_id).await
    }

    /// Mutate the line-item array by item id and recompute the total.
    ///
    /// Whether the customer is still *allowed* to edit is the caller's
    /// policy; this core only guarantees the write is consistent, via
    /// an optimistic `updated_at` compare-and-swap with bounded retries.
    pub async fn patch_items(&self, order_id: i64, patch: LineItemPatch) -> AppResult<Preorder> {
        for _ in 0..PATCH_ATTEMPTS {
            let order = preorder::find_by_id(&self.pool, order_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("preorder {order_id}")))?;

            let mut lines = order
                .lines()
                .map_err(|e| AppError::internal(format!("corrupt line items: {e}")))?;

            for upd in &patch.update {
                let line = lines
                    .iter_mut()
                    .find(|l| l.item_id == upd.item_id)
                    .ok_or_else(|| {
                        AppError::not_found(format!("line item {} not on order", upd.item_id))
                    })?;
                if upd.quantity < 0 {
                    return Err(AppError::validation(format!(
                        "line item {} has negative quantity",
                        upd.item_id
                    )));
                }
                line.quantity = upd.quantity;
            }
            lines.retain(|l| l.quantity > 0 && !patch.remove.contains(&l.item_id));
            for added in &patch.add {
                if added.quantity <= 0 {
                    return Err(AppError::validation(format!(
                        "line item {} has non-positive quantity",
                        added.item_id
                    )));
                }
                match lines.iter_mut().find(|l| l.item_id == added.item_id) {
                    Some(line) => line.quantity += added.quantity,
                    None => lines.push(added.clone()),
                }
            }
            if lines.is_empty() {
                return Err(AppError::validation("cannot remove every line item"));
            }

            let total = order_total(&lines);
            let items_json = serde_json::to_string(&lines)
                .map_err(|e| AppError::internal(format!("failed to encode line items: {e}")))?;

            if preorder::replace_lines(
                &self.pool,
                order_id,
                &items_json,
                total,
                order.updated_at,
                now_millis(),
            )
            .await?
                == 1
            {
                return self.require_order(order_id).await;
            }
            // Someone else wrote the order first; re-read and re-apply.
        }
        Err(AppError::Conflict(
            "preorder changed concurrently, patch retries exhausted".into(),
        ))
    }

    pub async fn find(&self, order_id: i64) -> AppResult<Option<Preorder>> {
        Ok(preorder::find_by_id(&self.pool, order_id).await?)
    }

    pub async fn find_by_code(
        &self,
        restaurant_id: i64,
        code: &str,
    ) -> AppResult<Option<Preorder>> {
        Ok(preorder::find_by_code(&self.pool, restaurant_id, code).await?)
    }

    async fn require_order(&self, order_id: i64) -> AppResult<Preorder> {
        preorder::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("preorder {order_id} vanished")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::LineQuantityUpdate;

    const R: i64 = 3;
    const C: i64 = 200;

    async fn service() -> PreorderService {
        let db = DbService::open_in_memory().await.unwrap();
        PreorderService::new(db.pool)
    }

    fn lines() -> Vec<OrderLine> {
        vec![
            OrderLine {
                item_id: 1,
                name: "Paella".into(),
                price: 12.5,
                quantity: 2,
            },
            OrderLine {
                item_id: 2,
                name: "Gazpacho".into(),
                price: 4.0,
                quantity: 1,
            },
        ]
    }

    #[tokio::test]
    async fn create_computes_total_and_allocates_code() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        assert_eq!(order.status, PreorderStatus::Pending);
        assert_eq!(order.total, 29.0);
        let code = order.code.unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn create_rejects_empty_and_invalid_lines() {
        let svc = service().await;
        let err = svc.create(C, R, vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut bad = lines();
        bad[0].quantity = 0;
        let err = svc.create(C, R, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn assign_table_moves_to_preparing_and_clears_code() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        let updated = svc.assign_table(order.id, 12).await.unwrap();
        assert_eq!(updated.status, PreorderStatus::Preparing);
        assert_eq!(updated.table_number, Some(12));
        assert_eq!(updated.code, None);
    }

    #[tokio::test]
    async fn assign_table_twice_is_invalid_state() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        svc.assign_table(order.id, 12).await.unwrap();
        let err = svc.assign_table(order.id, 13).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn assign_table_on_unknown_order_is_not_found() {
        let svc = service().await;
        let err = svc.assign_table(404, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn forward_transitions_advance_and_backward_are_rejected() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        svc.assign_table(order.id, 5).await.unwrap();

        let ready = svc.set_status(order.id, PreorderStatus::Ready).await.unwrap();
        assert_eq!(ready.status, PreorderStatus::Ready);

        let err = svc
            .set_status(order.id, PreorderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let done = svc
            .set_status(order.id, PreorderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, PreorderStatus::Completed);

        // Terminal: completed and cancelled cannot reach each other
        let err = svc
            .set_status(order.id, PreorderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancelling_a_pending_order_clears_its_code() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        assert!(order.code.is_some());

        let cancelled = svc
            .set_status(order.id, PreorderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, PreorderStatus::Cancelled);
        assert_eq!(cancelled.code, None);
    }

    #[tokio::test]
    async fn patch_items_recomputes_total() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();

        let patch = LineItemPatch {
            add: vec![OrderLine {
                item_id: 3,
                name: "Crema catalana".into(),
                price: 5.0,
                quantity: 1,
            }],
            update: vec![LineQuantityUpdate {
                item_id: 1,
                quantity: 1,
            }],
            remove: vec![2],
        };
        let patched = svc.patch_items(order.id, patch).await.unwrap();

        // 1×12.5 + 1×5.0, gazpacho removed
        assert_eq!(patched.total, 17.5);
        let items = patched.lines().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|l| l.item_id == 3));
        assert!(!items.iter().any(|l| l.item_id == 2));
    }

    #[tokio::test]
    async fn patch_merges_duplicate_adds_and_drops_zeroed_lines() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();

        let patch = LineItemPatch {
            add: vec![OrderLine {
                item_id: 1,
                name: "Paella".into(),
                price: 12.5,
                quantity: 1,
            }],
            update: vec![LineQuantityUpdate {
                item_id: 2,
                quantity: 0,
            }],
            remove: vec![],
        };
        let patched = svc.patch_items(order.id, patch).await.unwrap();
        let items = patched.lines().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(patched.total, 37.5);
    }

    #[tokio::test]
    async fn patch_unknown_line_is_not_found() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();

        let patch = LineItemPatch {
            update: vec![LineQuantityUpdate {
                item_id: 99,
                quantity: 1,
            }],
            ..Default::default()
        };
        let err = svc.patch_items(order.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn patch_cannot_empty_the_order() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();

        let patch = LineItemPatch {
            remove: vec![1, 2],
            ..Default::default()
        };
        let err = svc.patch_items(order.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn find_by_code_matches_only_within_restaurant() {
        let svc = service().await;
        let order = svc.create(C, R, lines()).await.unwrap();
        let code = order.code.clone().unwrap();

        let found = svc.find_by_code(R, &code).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(order.id));
        assert!(svc.find_by_code(R + 1, &code).await.unwrap().is_none());
    }
}

//! Short Code Allocator
//!
//! Staff-facing 6-digit numeric codes. Uniqueness is scoped: redemption
//! codes are unique across all live tickets, preorder codes per
//! restaurant. The allocator pre-checks liveness and the partial unique
//! indexes are the backstop — writers retry on a unique violation, so
//! the check/insert race window is closed (see the state machines).

use rand::Rng;
use sqlx::SqlitePool;

use crate::core::error::{AppError, AppResult};
use crate::db::repository::{preorder, redemption};

/// Bounded attempts before the allocator reports a transient failure.
/// At POS scale the live-code population is tiny against a 10^6
/// keyspace, so a second draw nearly always succeeds.
pub const CODE_ATTEMPTS: u32 = 5;

/// Uniqueness domain for a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeScope {
    /// Redemption tickets: one namespace across all restaurants
    Global,
    /// Preorders: one namespace per restaurant
    Restaurant(i64),
}

#[derive(Clone)]
pub struct CodeAllocator {
    pool: SqlitePool,
}

impl CodeAllocator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Draw a code not currently live in `scope`.
    ///
    /// Fails with [`AppError::CodesExhausted`] after [`CODE_ATTEMPTS`]
    /// collisions — a transient condition, not a business outcome.
    pub async fn allocate(&self, scope: CodeScope) -> AppResult<String> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code();
            let taken = match scope {
                CodeScope::Global => redemption::code_in_use(&self.pool, &code).await?,
                CodeScope::Restaurant(id) => {
                    preorder::code_in_use(&self.pool, id, &code).await?
                }
            };
            if !taken {
                return Ok(code);
            }
            tracing::debug!(code = %code, ?scope, "Code collision, drawing again");
        }
        Err(AppError::CodesExhausted(CODE_ATTEMPTS))
    }
}

/// Uniform draw over `000000..=999999`, left-padded
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[test]
    fn codes_are_six_decimal_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn allocates_against_empty_store() {
        let db = DbService::open_in_memory().await.unwrap();
        let allocator = CodeAllocator::new(db.pool);
        let code = allocator.allocate(CodeScope::Global).await.unwrap();
        assert_eq!(code.len(), 6);
        let code = allocator.allocate(CodeScope::Restaurant(1)).await.unwrap();
        assert_eq!(code.len(), 6);
    }
}

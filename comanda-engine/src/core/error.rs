//! 统一错误处理
//!
//! 业务失败（余额不足、码无效、状态非法等）是正常的类型化结果，
//! 映射为 4xx；基础设施失败映射为 5xx。HTTP 层不在本 crate 范围内，
//! 由调用方通过 [`AppError::status_code`] 翻译响应码。

use thiserror::Error;

use crate::db::repository::RepoError;

/// 应用错误枚举
///
/// | 分类 | 说明 |
/// |------|------|
/// | 业务错误 (4xx) | 库存不足、余额不足、状态非法、码无效/过期 |
/// | 系统错误 (5xx) | 数据库错误、码空间耗尽、内部错误 |
#[derive(Debug, Error)]
pub enum AppError {
    // ========== 业务错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Reward item out of stock")]
    /// 库存不足 (409)
    OutOfStock,

    #[error("Insufficient points balance")]
    /// 积分余额不足 (400)
    InsufficientBalance,

    #[error("Invalid state transition: {0}")]
    /// 状态机非法转移 (409)
    InvalidState(String),

    #[error("No ticket matches this code")]
    /// 码无效 (404)
    InvalidCode,

    #[error("Permission denied: {0}")]
    /// 跨店操作被拒绝 (403)
    Forbidden(String),

    #[error("Code expired")]
    /// 激活窗口已过 (410)
    Expired,

    #[error("Conflict: {0}")]
    /// 并发写冲突，重试耗尽 (409)
    Conflict(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Code space exhausted after {0} attempts")]
    /// 短码分配重试耗尽，瞬态故障 (503)
    CodesExhausted(u32),

    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP 等价响应码（HTTP 层自行翻译为响应）
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) | AppError::InvalidCode => 404,
            AppError::OutOfStock | AppError::InvalidState(_) | AppError::Conflict(_) => 409,
            AppError::InsufficientBalance | AppError::Validation(_) => 400,
            AppError::Forbidden(_) => 403,
            AppError::Expired => 410,
            AppError::CodesExhausted(_) => 503,
            AppError::Database(_) | AppError::Internal(_) => 500,
        }
    }

    /// 是否为预期的业务结果（而非基础设施故障）
    pub fn is_business(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            // An unhandled unique violation reaching this layer means the
            // allocator retry loop was bypassed or exhausted.
            RepoError::Duplicate(msg) => AppError::Database(format!("unique violation: {msg}")),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// 业务层 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_4xx() {
        assert_eq!(AppError::InsufficientBalance.status_code(), 400);
        assert_eq!(AppError::OutOfStock.status_code(), 409);
        assert_eq!(AppError::InvalidCode.status_code(), 404);
        assert_eq!(AppError::Expired.status_code(), 410);
        assert_eq!(AppError::forbidden("cross-restaurant").status_code(), 403);
        assert!(AppError::Expired.is_business());
    }

    #[test]
    fn infrastructure_errors_map_to_5xx() {
        assert_eq!(AppError::CodesExhausted(5).status_code(), 503);
        assert_eq!(AppError::database("boom").status_code(), 500);
        assert!(!AppError::database("boom").is_business());
    }

    #[test]
    fn repo_errors_convert() {
        let err: AppError = RepoError::NotFound("ticket 1".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = RepoError::Duplicate("code".into()).into();
        assert!(matches!(err, AppError::Database(_)));
    }
}

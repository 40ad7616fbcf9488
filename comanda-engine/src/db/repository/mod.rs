//! Repository Module
//!
//! Single-statement CRUD operations against the SQLite store. Every
//! invariant-bearing mutation is a *conditional* write (the predicate
//! lives in the WHERE clause), never an application-level
//! read-modify-write.

pub mod points;
pub mod preorder;
pub mod redemption;
pub mod reward;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

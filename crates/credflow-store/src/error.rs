//! Store error types

use thiserror::Error;
use uuid::Uuid;

/// Record store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// The version guard did not match: someone else updated the record
    /// between our load and our save
    #[error("stale update for record {id}: version {expected} no longer current")]
    Conflict { id: Uuid, expected: i64 },

    /// A persisted row no longer maps onto the domain model
    #[error("corrupt record row: {0}")]
    Corrupt(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

//! Credflow Store - persistence for exchange records
//!
//! The record store is the only shared mutable resource in the system, and
//! every webhook's load-check-mutate-save path is a critical section per
//! record. Both implementations enforce an optimistic version guard: an
//! update only lands if the record's `version` still matches the value it
//! was loaded at, and a miss surfaces as [`StoreError::Conflict`] so the
//! caller can drop its stale write.
//!
//! - [`SqliteStore`]: sqlx-backed, migration-managed, for deployment
//! - [`MemoryStore`]: in-process, for tests and demos

pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use credflow_types::ExchangeRecord;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistent exchange-record store.
///
/// Records are created once, updated under a version guard, and never
/// deleted — the table is the audit trail.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a freshly created record
    async fn create(&self, record: &ExchangeRecord) -> StoreResult<()>;

    /// Fetch a record by its explicit handle
    async fn get(&self, id: Uuid) -> StoreResult<Option<ExchangeRecord>>;

    /// Fetch the newest record correlated to an agent connection.
    /// An unknown connection id is `Ok(None)`, never an error.
    async fn find_by_connection(&self, connection_id: &str)
        -> StoreResult<Option<ExchangeRecord>>;

    /// All records for a subject, newest first
    async fn list_for_subject(&self, subject_id: &str) -> StoreResult<Vec<ExchangeRecord>>;

    /// Version-guarded update. `record.version` must be the value the record
    /// was loaded at; the stored row gets `version + 1` and a fresh
    /// `updated_at`. Returns the persisted record.
    async fn update(&self, record: &ExchangeRecord) -> StoreResult<ExchangeRecord>;
}

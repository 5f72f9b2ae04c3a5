//! In-memory record store for tests and demos

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use credflow_types::ExchangeRecord;

use crate::error::{StoreError, StoreResult};
use crate::RecordStore;

/// HashMap-backed [`RecordStore`] with the same version-guard semantics as
/// the SQLite store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, ExchangeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, record: &ExchangeRecord) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ExchangeRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_connection(
        &self,
        connection_id: &str,
    ) -> StoreResult<Option<ExchangeRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.connection_id == connection_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list_for_subject(&self, subject_id: &str) -> StoreResult<Vec<ExchangeRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<ExchangeRecord> = records
            .values()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update(&self, record: &ExchangeRecord) -> StoreResult<ExchangeRecord> {
        let mut records = self.records.write().await;
        let current = records
            .get(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        if current.version != record.version {
            return Err(StoreError::Conflict {
                id: record.id,
                expected: record.version,
            });
        }
        let mut next = record.clone();
        next.version = record.version + 1;
        next.updated_at = Utc::now();
        records.insert(next.id, next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credflow_types::ExchangeState;

    #[tokio::test]
    async fn version_guard_matches_sqlite_semantics() {
        let store = MemoryStore::new();
        let record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&record).await.unwrap();

        let loaded = store.get(record.id).await.unwrap().unwrap();
        let stale = loaded.clone();

        let mut fresh = loaded;
        fresh.state = ExchangeState::OfferSent;
        let updated = store.update(&fresh).await.unwrap();
        assert_eq!(updated.version, 1);

        let mut racer = stale;
        racer.state = ExchangeState::OfferSent;
        assert!(matches!(
            store.update(&racer).await,
            Err(StoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn updating_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        assert!(matches!(
            store.update(&record).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_by_connection_prefers_newest() {
        let store = MemoryStore::new();
        let mut old = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        old.created_at = old.created_at - chrono::Duration::seconds(60);
        let new = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&old).await.unwrap();
        store.create(&new).await.unwrap();

        let found = store.find_by_connection("c-1").await.unwrap().unwrap();
        assert_eq!(found.id, new.id);
    }
}

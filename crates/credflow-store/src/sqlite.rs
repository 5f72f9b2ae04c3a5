//! SQLite-backed record store

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use credflow_types::ExchangeRecord;

use crate::error::{StoreError, StoreResult};
use crate::models::RecordRow;
use crate::RecordStore;

/// sqlx/SQLite implementation of [`RecordStore`]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a SQLite database, creating the file if needed, and run
    /// migrations.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        info!(url, "Connecting to SQLite");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory database for tests and demos. Single connection: each
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create(&self, record: &ExchangeRecord) -> StoreResult<()> {
        let row = RecordRow::from_record(record);
        sqlx::query(
            r#"
            INSERT INTO exchange_records (id, subject_id, given_name, family_name,
                connection_id, credential_exchange_id, presentation_exchange_id,
                revocation_registry_id, revocation_id, state, version,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.subject_id)
        .bind(&row.given_name)
        .bind(&row.family_name)
        .bind(&row.connection_id)
        .bind(&row.credential_exchange_id)
        .bind(&row.presentation_exchange_id)
        .bind(&row.revocation_registry_id)
        .bind(&row.revocation_id)
        .bind(&row.state)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ExchangeRecord>> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT * FROM exchange_records WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(RecordRow::into_record).transpose()
    }

    async fn find_by_connection(
        &self,
        connection_id: &str,
    ) -> StoreResult<Option<ExchangeRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM exchange_records WHERE connection_id = ? \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RecordRow::into_record).transpose()
    }

    async fn list_for_subject(&self, subject_id: &str) -> StoreResult<Vec<ExchangeRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM exchange_records WHERE subject_id = ? ORDER BY created_at DESC",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    async fn update(&self, record: &ExchangeRecord) -> StoreResult<ExchangeRecord> {
        let mut next = record.clone();
        next.version = record.version + 1;
        next.updated_at = Utc::now();
        let row = RecordRow::from_record(&next);

        let result = sqlx::query(
            r#"
            UPDATE exchange_records
            SET credential_exchange_id = ?, presentation_exchange_id = ?,
                revocation_registry_id = ?, revocation_id = ?, state = ?,
                version = ?, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&row.credential_exchange_id)
        .bind(&row.presentation_exchange_id)
        .bind(&row.revocation_registry_id)
        .bind(&row.revocation_id)
        .bind(&row.state)
        .bind(row.version)
        .bind(row.updated_at)
        .bind(&row.id)
        .bind(record.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::Conflict {
                id: record.id,
                expected: record.version,
            });
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credflow_types::ExchangeState;

    #[tokio::test]
    async fn create_and_get() {
        let store = SqliteStore::in_memory().await.unwrap();
        let record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&record).await.unwrap();

        let loaded = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(loaded.connection_id, "c-1");
        assert_eq!(loaded.state, ExchangeState::InvitationSent);
    }

    #[tokio::test]
    async fn unknown_connection_is_none() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.find_by_connection("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_connection_returns_newest() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut old = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        old.created_at = old.created_at - chrono::Duration::seconds(60);
        let new = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&old).await.unwrap();
        store.create(&new).await.unwrap();

        let found = store.find_by_connection("c-1").await.unwrap().unwrap();
        assert_eq!(found.id, new.id);
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&record).await.unwrap();

        record.state = ExchangeState::OfferSent;
        record.credential_exchange_id = "cx-1".to_string();
        let updated = store.update(&record).await.unwrap();
        assert_eq!(updated.version, 1);

        let loaded = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, ExchangeState::OfferSent);
        assert_eq!(loaded.credential_exchange_id, "cx-1");
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn stale_update_is_conflict() {
        let store = SqliteStore::in_memory().await.unwrap();
        let record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&record).await.unwrap();

        let mut first = store.get(record.id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.state = ExchangeState::OfferSent;
        store.update(&first).await.unwrap();

        second.state = ExchangeState::OfferSent;
        let err = store.update(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn list_for_subject_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut old = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        old.created_at = old.created_at - chrono::Duration::seconds(60);
        let new = ExchangeRecord::new("alice", "Alice", "Aster", "c-2");
        store.create(&old).await.unwrap();
        store.create(&new).await.unwrap();
        store
            .create(&ExchangeRecord::new("bob", "Bob", "Birch", "c-3"))
            .await
            .unwrap();

        let records = store.list_for_subject("alice").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, new.id);
    }
}

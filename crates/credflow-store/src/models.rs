//! Row models for the SQLite store
//!
//! Rows keep ids and states as plain text; conversion to the domain record
//! validates both, so a corrupt row is an explicit error rather than a
//! panic deep in a webhook handler.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use credflow_types::{ExchangeRecord, ExchangeState};

use crate::error::{StoreError, StoreResult};

/// Database row for an exchange record
#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub subject_id: String,
    pub given_name: String,
    pub family_name: String,
    pub connection_id: String,
    pub credential_exchange_id: String,
    pub presentation_exchange_id: String,
    pub revocation_registry_id: String,
    pub revocation_id: String,
    pub state: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordRow {
    pub fn from_record(record: &ExchangeRecord) -> Self {
        Self {
            id: record.id.to_string(),
            subject_id: record.subject_id.clone(),
            given_name: record.given_name.clone(),
            family_name: record.family_name.clone(),
            connection_id: record.connection_id.clone(),
            credential_exchange_id: record.credential_exchange_id.clone(),
            presentation_exchange_id: record.presentation_exchange_id.clone(),
            revocation_registry_id: record.revocation_registry_id.clone(),
            revocation_id: record.revocation_id.clone(),
            state: record.state.as_str().to_string(),
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn into_record(self) -> StoreResult<ExchangeRecord> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Corrupt(format!("id {:?}: {e}", self.id)))?;
        let state: ExchangeState = self
            .state
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("record {id}: {e}")))?;
        Ok(ExchangeRecord {
            id,
            subject_id: self.subject_id,
            given_name: self.given_name,
            family_name: self.family_name,
            connection_id: self.connection_id,
            credential_exchange_id: self.credential_exchange_id,
            presentation_exchange_id: self.presentation_exchange_id,
            revocation_registry_id: self.revocation_registry_id,
            revocation_id: self.revocation_id,
            state,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

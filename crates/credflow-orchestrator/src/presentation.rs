//! Proof requests against an issued credential

use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use credflow_agent::ProofRequest;
use credflow_types::ExchangeState;

use crate::{Orchestrator, OrchestratorError, OrchestratorResult};

/// Today as the YYYYMMDD integer the `expires >=` predicate compares against
fn today_stamp() -> i64 {
    let now = Utc::now();
    (now.year() as i64) * 10_000 + (now.month() as i64) * 100 + now.day() as i64
}

impl Orchestrator {
    /// Ask the subject behind `record_id` to prove their credential.
    ///
    /// Only allowed once the credential is issued. A new request overwrites
    /// any outstanding presentation exchange id; the stale exchange's
    /// eventual webhook fails the id match and is ignored.
    pub async fn request_presentation(&self, record_id: Uuid) -> OrchestratorResult<String> {
        let record = self
            .store()
            .get(record_id)
            .await?
            .ok_or(OrchestratorError::NoRecord(record_id))?;

        if record.state != ExchangeState::CredentialIssued {
            return Err(OrchestratorError::PresentationNotAllowed {
                state: record.state,
            });
        }

        let request = ProofRequest::new("credential-check")
            .attribute("given_name")
            .attribute("family_name")
            .predicate("expires", ">=", today_stamp());

        let presentation_exchange_id = self
            .agent()
            .send_proof_request(self.settings().protocol, &record.connection_id, &request)
            .await?;

        let mut next = record;
        next.presentation_exchange_id = presentation_exchange_id.clone();
        self.store().update(&next).await?;

        info!(
            record_id = %record_id,
            presentation_exchange_id,
            "proof request sent"
        );
        Ok(presentation_exchange_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use credflow_store::{MemoryStore, RecordStore};
    use credflow_types::{ExchangeRecord, ExchangeState};
    use uuid::Uuid;

    use crate::testutil::{Call, FakeAgent};
    use crate::{IssuanceSettings, Orchestrator, OrchestratorError};

    async fn issued_record(store: &MemoryStore) -> ExchangeRecord {
        let mut record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        record.state = ExchangeState::CredentialIssued;
        record.credential_exchange_id = "cx-1".to_string();
        store.create(&record).await.unwrap();
        record
    }

    #[tokio::test]
    async fn request_stores_presentation_exchange_id() {
        let agent = Arc::new(FakeAgent::new());
        let store = Arc::new(MemoryStore::new());
        let record = issued_record(&store).await;
        let orch = Orchestrator::new(agent.clone(), store.clone(), IssuanceSettings::default());

        let pres_ex_id = orch.request_presentation(record.id).await.unwrap();
        assert_eq!(pres_ex_id, "px-1");
        assert!(agent
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ProofRequest { connection_id } if connection_id == "c-1")));

        let updated = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(updated.presentation_exchange_id, "px-1");
        assert_eq!(updated.state, ExchangeState::CredentialIssued);
    }

    #[tokio::test]
    async fn request_requires_issued_credential() {
        let agent = Arc::new(FakeAgent::new());
        let store = Arc::new(MemoryStore::new());
        let record = ExchangeRecord::new("alice", "Alice", "Aster", "c-1");
        store.create(&record).await.unwrap();
        let orch = Orchestrator::new(agent.clone(), store, IssuanceSettings::default());

        let err = orch.request_presentation(record.id).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::PresentationNotAllowed {
                state: ExchangeState::InvitationSent
            }
        ));
        assert!(agent.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_no_record() {
        let agent = Arc::new(FakeAgent::new());
        let store = Arc::new(MemoryStore::new());
        let orch = Orchestrator::new(agent, store, IssuanceSettings::default());

        let missing = Uuid::new_v4();
        let err = orch.request_presentation(missing).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NoRecord(id) if id == missing));
    }

    #[tokio::test]
    async fn new_request_overwrites_outstanding_exchange_id() {
        let agent = Arc::new(FakeAgent::new());
        let store = Arc::new(MemoryStore::new());
        let record = issued_record(&store).await;
        let orch = Orchestrator::new(agent, store.clone(), IssuanceSettings::default());

        orch.request_presentation(record.id).await.unwrap();
        orch.request_presentation(record.id).await.unwrap();

        let updated = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(updated.presentation_exchange_id, "px-1");
        assert_eq!(updated.version, 2);
    }
}

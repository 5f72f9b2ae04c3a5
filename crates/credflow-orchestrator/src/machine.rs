//! The transition table: webhook event in, guarded action + new state out

use tracing::{info, warn};

use credflow_agent::CredentialAttribute;
use credflow_store::StoreError;
use credflow_types::{
    ConnectionEvent, CredentialEvent, ExchangeRecord, ExchangeState, PresentationEvent,
};

use crate::{Disposition, Orchestrator, OrchestratorError, OrchestratorResult};

impl Orchestrator {
    /// Connection / DID-exchange state change.
    ///
    /// `active`/`completed` on a record still in `InvitationSent` sends the
    /// welcome message and the credential offer, then advances to
    /// `OfferSent`. Everything else is a no-op.
    pub async fn handle_connection_event(
        &self,
        event: &ConnectionEvent,
    ) -> OrchestratorResult<Disposition> {
        let Some(connection_id) = event.connection_id.as_deref() else {
            return Ok(Disposition::Ignored("missing connection_id"));
        };
        let Some(record) = self.store().find_by_connection(connection_id).await? else {
            info!(connection_id, "connection event for unknown connection");
            return Ok(Disposition::Ignored("unknown connection"));
        };

        if !event.is_established() {
            return Ok(Disposition::Ignored("connection not yet established"));
        }
        if record.state != ExchangeState::InvitationSent {
            // Redelivered webhook; the offer already went out.
            return Ok(Disposition::Ignored("offer already sent"));
        }

        info!(connection_id, record_id = %record.id, "connection established, sending offer");

        self.agent()
            .send_message(connection_id, &self.settings().welcome_message)
            .await?;

        let attributes = self.preview_attributes(&record);
        let credential_exchange_id = self
            .agent()
            .send_credential_offer(
                self.settings().protocol,
                connection_id,
                &self.settings().cred_def_id,
                &attributes,
            )
            .await?;

        let mut next = record;
        next.credential_exchange_id = credential_exchange_id;
        next.state = ExchangeState::OfferSent;
        match self.store().update(&next).await {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => {
                warn!(connection_id, "concurrent update won, dropping transition");
                return Ok(Disposition::Ignored("concurrent update won"));
            }
            Err(e) => return Err(e.into()),
        }

        self.notify(connection_id, "connection_active").await;
        Ok(Disposition::Advanced(ExchangeState::OfferSent))
    }

    /// Credential-exchange state change.
    pub async fn handle_credential_event(
        &self,
        event: &CredentialEvent,
    ) -> OrchestratorResult<Disposition> {
        let Some(connection_id) = event.connection_id.as_deref() else {
            return Ok(Disposition::Ignored("missing connection_id"));
        };
        let Some(record) = self.store().find_by_connection(connection_id).await? else {
            info!(connection_id, "credential event for unknown connection");
            return Ok(Disposition::Ignored("unknown connection"));
        };

        // One subject's events must never mutate another subject's record:
        // a non-matching exchange id is ignored, not applied.
        if let Some(event_ex) = event.cred_ex_id.as_deref() {
            if !record.credential_exchange_id.is_empty()
                && record.credential_exchange_id != event_ex
            {
                warn!(
                    connection_id,
                    event_exchange = event_ex,
                    "credential event exchange id does not match record"
                );
                return Ok(Disposition::Ignored("exchange id mismatch"));
            }
        }

        match event.state.as_deref() {
            Some("request_received") => self.on_credential_request(event, record).await,
            Some("credential_acked") | Some("credential_issued") | Some("done") => {
                self.on_credential_issued(event, record).await
            }
            Some("abandoned") => {
                if record.state == ExchangeState::OfferSent {
                    info!(
                        connection_id,
                        error_msg = event.error_msg.as_deref().unwrap_or(""),
                        "subject declined the credential offer"
                    );
                }
                Ok(Disposition::Ignored("exchange abandoned"))
            }
            other => {
                info!(connection_id, state = other.unwrap_or(""), "unhandled credential state");
                Ok(Disposition::Ignored("unhandled credential state"))
            }
        }
    }

    /// The holder accepted the offer and sent a credential request. If the
    /// agent is not auto-issuing we must issue manually, exactly once.
    async fn on_credential_request(
        &self,
        event: &CredentialEvent,
        record: ExchangeRecord,
    ) -> OrchestratorResult<Disposition> {
        if record.state != ExchangeState::OfferSent {
            return Ok(Disposition::Ignored("not expecting a credential request"));
        }

        let exchange_id = event
            .cred_ex_id
            .clone()
            .unwrap_or_else(|| record.credential_exchange_id.clone());
        if exchange_id.is_empty() {
            return Ok(Disposition::Ignored("no exchange id to issue against"));
        }

        let auto_issue = event.auto_issue.unwrap_or(self.settings().auto_issue);
        if !auto_issue {
            info!(exchange_id, "issuing credential");
            self.agent()
                .issue_credential(self.settings().protocol, &exchange_id)
                .await?;
        }

        let mut next = record;
        next.credential_exchange_id = exchange_id;
        next.state = ExchangeState::CredentialIssued;
        self.guarded_update(next).await
    }

    /// The holder's wallet holds the credential (or the agent completed
    /// issuance on its own); record the revocation handles.
    async fn on_credential_issued(
        &self,
        event: &CredentialEvent,
        record: ExchangeRecord,
    ) -> OrchestratorResult<Disposition> {
        if !matches!(
            record.state,
            ExchangeState::OfferSent | ExchangeState::CredentialIssued
        ) {
            return Ok(Disposition::Ignored("not expecting issuance"));
        }

        let connection_id = record.connection_id.clone();
        let mut next = record;
        next.revocation_registry_id = event.revocation_registry_id.clone().unwrap_or_default();
        next.revocation_id = event.revocation_id.clone().unwrap_or_default();
        next.state = ExchangeState::CredentialIssued;

        let disposition = self.guarded_update(next).await?;
        if matches!(disposition, Disposition::Advanced(_)) {
            info!(connection_id, "issuance complete");
            self.notify(&connection_id, "issuance_complete").await;
        }
        Ok(disposition)
    }

    /// Presentation-exchange state change: a terminal outcome whose exchange
    /// id matches the outstanding request clears it.
    pub async fn handle_presentation_event(
        &self,
        event: &PresentationEvent,
    ) -> OrchestratorResult<Disposition> {
        let Some(connection_id) = event.connection_id.as_deref() else {
            return Ok(Disposition::Ignored("missing connection_id"));
        };
        let Some(record) = self.store().find_by_connection(connection_id).await? else {
            return Ok(Disposition::Ignored("unknown connection"));
        };

        if !record.has_pending_presentation() {
            return Ok(Disposition::Ignored("no outstanding proof request"));
        }
        if event.pres_ex_id.as_deref() != Some(record.presentation_exchange_id.as_str()) {
            return Ok(Disposition::Ignored("presentation exchange id mismatch"));
        }

        match event.state.as_deref() {
            Some("verified") => info!(connection_id, "subject presented successfully"),
            Some("abandoned") => info!(connection_id, "subject declined presentation"),
            _ => return Ok(Disposition::Ignored("presentation not yet terminal")),
        }

        let state = record.state;
        let mut next = record;
        next.presentation_exchange_id = String::new();
        match self.store().update(&next).await {
            Ok(_) => Ok(Disposition::Advanced(state)),
            Err(StoreError::Conflict { .. }) => {
                Ok(Disposition::Ignored("concurrent update won"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn guarded_update(&self, next: ExchangeRecord) -> OrchestratorResult<Disposition> {
        let state = next.state;
        match self.store().update(&next).await {
            Ok(_) => Ok(Disposition::Advanced(state)),
            Err(StoreError::Conflict { .. }) => {
                warn!(record_id = %next.id, "concurrent update won, dropping transition");
                Ok(Disposition::Ignored("concurrent update won"))
            }
            Err(e) => Err(OrchestratorError::Store(e)),
        }
    }

    fn preview_attributes(&self, record: &ExchangeRecord) -> Vec<CredentialAttribute> {
        vec![
            CredentialAttribute::new("given_name", record.given_name.clone()),
            CredentialAttribute::new("family_name", record.family_name.clone()),
            CredentialAttribute::new("expires", self.settings().credential_expires.clone()),
        ]
    }
}

//! Invitation issuance: create an out-of-band invitation and open a new
//! exchange record for the subject.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use credflow_types::ExchangeRecord;

use crate::{Orchestrator, OrchestratorError, OrchestratorResult};

/// The person a credential is being issued to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub given_name: String,
    pub family_name: String,
}

/// Result of issuing an invitation: the record handle plus whatever the
/// caller needs to render the invitation (QR code, deep link).
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvitation {
    pub record_id: Uuid,
    pub connection_id: String,
    /// URL form when the agent provides one, otherwise the invitation JSON
    pub render_payload: String,
    pub invitation_url: Option<String>,
}

impl Orchestrator {
    /// Create an out-of-band invitation for `subject` and persist a fresh
    /// exchange record in `InvitationSent`.
    ///
    /// Repeated calls for the same subject create independent records; the
    /// newest one wins webhook correlation, and the agent expires the
    /// abandoned connections on its own.
    pub async fn issue_invitation(
        &self,
        subject: &Subject,
        alias: Option<&str>,
    ) -> OrchestratorResult<IssuedInvitation> {
        let created = self
            .agent()
            .create_invitation(alias, true, false, self.settings().use_public_did)
            .await?;

        let connection_id = created
            .connection_id
            .ok_or(OrchestratorError::InvitationIncomplete("connection_id"))?;

        let render_payload = match (&created.invitation_url, &created.invitation) {
            (Some(url), _) => url.clone(),
            (None, Some(invitation)) => serde_json::to_string(invitation)
                .map_err(|_| OrchestratorError::InvitationIncomplete("invitation"))?,
            (None, None) => {
                return Err(OrchestratorError::InvitationIncomplete("invitation"));
            }
        };

        let record = ExchangeRecord::new(
            &subject.subject_id,
            &subject.given_name,
            &subject.family_name,
            &connection_id,
        );
        self.store().create(&record).await?;

        info!(
            record_id = %record.id,
            connection_id,
            subject_id = subject.subject_id,
            "invitation issued"
        );

        Ok(IssuedInvitation {
            record_id: record.id,
            connection_id,
            render_payload,
            invitation_url: created.invitation_url,
        })
    }
}

//! Exchange records - one per subject-credential lifecycle

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Protocol state of an exchange record.
///
/// Closed set: the state machine matches exhaustively, so adding a protocol
/// state is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeState {
    /// Invitation created and handed to the subject; waiting for the wallet
    /// to complete the DID exchange
    InvitationSent,
    /// Connection is active and the credential offer has gone out
    OfferSent,
    /// The credential was issued (or its issuance acknowledged)
    CredentialIssued,
}

impl ExchangeState {
    /// Stable string form used in persistence and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvitationSent => "INVITATION_SENT",
            Self::OfferSent => "OFFER_SENT",
            Self::CredentialIssued => "CREDENTIAL_ISSUED",
        }
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a persisted state string
#[derive(Debug, Error)]
#[error("unknown exchange state: {0}")]
pub struct ParseStateError(pub String);

impl FromStr for ExchangeState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVITATION_SENT" => Ok(Self::InvitationSent),
            "OFFER_SENT" => Ok(Self::OfferSent),
            "CREDENTIAL_ISSUED" => Ok(Self::CredentialIssued),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}

/// One subject-credential lifecycle.
///
/// Created by the invitation issuer in `InvitationSent`, mutated only by the
/// orchestration state machine in response to webhook events, never deleted.
/// A subject restarting the flow gets a fresh record; the old one remains as
/// audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Explicit record handle; returned to the client at invitation time
    pub id: Uuid,
    /// The subject this record belongs to
    pub subject_id: String,
    /// Subject's given name, snapshotted for the credential preview
    pub given_name: String,
    /// Subject's family name, snapshotted for the credential preview
    pub family_name: String,
    /// Correlates all agent callbacks to this record; immutable after create
    pub connection_id: String,
    /// In-flight credential exchange; empty until an offer is sent
    pub credential_exchange_id: String,
    /// In-flight proof request; empty when none is outstanding
    pub presentation_exchange_id: String,
    /// Populated once the credential is acknowledged as issued
    pub revocation_registry_id: String,
    /// Populated once the credential is acknowledged as issued
    pub revocation_id: String,
    /// Where this subject is in the protocol
    pub state: ExchangeState,
    /// Optimistic-concurrency counter; bumped on every persisted update
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRecord {
    /// Create a fresh record in `InvitationSent` for the given subject and
    /// agent-assigned connection id
    pub fn new(
        subject_id: impl Into<String>,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            given_name: given_name.into(),
            family_name: family_name.into(),
            connection_id: connection_id.into(),
            credential_exchange_id: String::new(),
            presentation_exchange_id: String::new(),
            revocation_registry_id: String::new(),
            revocation_id: String::new(),
            state: ExchangeState::InvitationSent,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a proof request is currently outstanding
    pub fn has_pending_presentation(&self) -> bool {
        !self.presentation_exchange_id.is_empty()
    }
}

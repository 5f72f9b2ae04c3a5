//! Credflow Orchestrator - the credential-issuance state machine
//!
//! Given a webhook event and the current exchange record, decide the next
//! protocol action (none, send message, send offer, issue, clear
//! presentation) and the next record state, then execute the action through
//! the injected [`AgentApi`].
//!
//! # Design rules
//!
//! - **Guard by state**: every transition checks the record's current state
//!   first; an event whose precondition does not hold is a silent no-op. The
//!   agent redelivers webhooks, so duplicates and reordering are normal, and
//!   state-guarded transitions are the only ordering discipline.
//! - **Correlation, not trust**: the event's connection/exchange ids must
//!   match the stored record; mismatches are ignored rather than applied.
//! - **At-most-one manual issue**: the explicit issue call fires only when
//!   the agent reports it is not auto-issuing.
//! - Agent failures propagate and leave the record unadvanced; the next
//!   redelivered webhook is the retry.

pub mod invitation;
pub mod machine;
pub mod presentation;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use credflow_agent::{AgentApi, AgentError, ProtocolVersion};
use credflow_store::{RecordStore, StoreError};
use credflow_types::ExchangeState;

pub use invitation::{IssuedInvitation, Subject};

/// Errors surfaced by orchestration operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("agent call failed: {0}")]
    Agent(#[from] AgentError),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// A proof was requested for a record that does not exist
    #[error("no exchange record {0}")]
    NoRecord(Uuid),

    /// A proof was requested before the credential was issued
    #[error("proof request not allowed in state {state}")]
    PresentationNotAllowed { state: ExchangeState },

    /// The agent's invitation response lacked a field we cannot proceed
    /// without
    #[error("invitation response missing {0}")]
    InvitationIncomplete(&'static str),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// What the state machine did with an event.
///
/// Business-rule no-ops are not errors — the webhook caller answers success
/// either way — but tests and logs want to see why nothing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The record moved to (or was confirmed in) this state
    Advanced(ExchangeState),
    /// Precondition or correlation guard rejected the event
    Ignored(&'static str),
}

/// Sink for coarse lifecycle notifications to an external endpoint.
///
/// Notification delivery must never affect record state, so the trait is
/// infallible; implementations log their own failures.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, connection_id: &str, event_type: &str);
}

/// Issuance behaviour shared by every flow
#[derive(Debug, Clone)]
pub struct IssuanceSettings {
    /// Credential definition the offers are made against
    pub cred_def_id: String,
    /// Protocol generation used for offers, issuance, and proof requests
    pub protocol: ProtocolVersion,
    /// Whether the agent auto-issues; used when an event does not say
    pub auto_issue: bool,
    /// YYYYMMDD expiry stamped into each credential
    pub credential_expires: String,
    /// Basic message sent once the connection is established
    pub welcome_message: String,
    /// Whether invitations are created against the public DID
    pub use_public_did: bool,
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self {
            cred_def_id: String::new(),
            protocol: ProtocolVersion::V2,
            auto_issue: false,
            credential_expires: "20991231".to_string(),
            welcome_message:
                "Your connection is established; a credential will arrive in your wallet shortly."
                    .to_string(),
            use_public_did: false,
        }
    }
}

/// The orchestration core: one instance per process, constructed in main
/// with its collaborators injected.
pub struct Orchestrator {
    agent: Arc<dyn AgentApi>,
    store: Arc<dyn RecordStore>,
    settings: IssuanceSettings,
    notifier: Option<Arc<dyn EventNotifier>>,
}

impl Orchestrator {
    pub fn new(
        agent: Arc<dyn AgentApi>,
        store: Arc<dyn RecordStore>,
        settings: IssuanceSettings,
    ) -> Self {
        Self {
            agent,
            store,
            settings,
            notifier: None,
        }
    }

    /// Attach an external notification sink
    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The record store this orchestrator mutates
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub(crate) fn agent(&self) -> &Arc<dyn AgentApi> {
        &self.agent
    }

    pub(crate) fn settings(&self) -> &IssuanceSettings {
        &self.settings
    }

    pub(crate) async fn notify(&self, connection_id: &str, event_type: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(connection_id, event_type).await;
        }
    }
}

//! Webhook event payloads as the Issuer Agent delivers them
//!
//! The agent reports the same events under slightly different field names
//! depending on protocol version (`credential_exchange_id` vs `cred_ex_id`,
//! `presentation_exchange_id` vs `pres_ex_id`); serde aliases absorb the
//! drift so handlers see one shape.

use serde::Deserialize;

/// Connection / DID-exchange state change
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEvent {
    pub connection_id: Option<String>,
    pub state: Option<String>,
}

/// Credential-exchange state change
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEvent {
    pub connection_id: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "credential_exchange_id")]
    pub cred_ex_id: Option<String>,
    /// Whether the agent issues without a manual issue call
    pub auto_issue: Option<bool>,
    #[serde(alias = "revoc_reg_id", alias = "rev_reg_id")]
    pub revocation_registry_id: Option<String>,
    #[serde(alias = "cred_rev_id")]
    pub revocation_id: Option<String>,
    /// Problem-report text on abandoned exchanges
    pub error_msg: Option<String>,
}

/// Presentation-exchange state change
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationEvent {
    pub connection_id: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "presentation_exchange_id")]
    pub pres_ex_id: Option<String>,
}

impl ConnectionEvent {
    /// Whether the DID exchange has completed on both sides
    pub fn is_established(&self) -> bool {
        matches!(self.state.as_deref(), Some("active") | Some("completed"))
    }
}

//! Credflow Agent - typed client for the Issuer Agent admin API
//!
//! The Issuer Agent implements the actual DID-exchange and credential-exchange
//! protocols; this crate only wraps its admin REST API. Every call is a
//! stateless request/response: one synchronous HTTP request with a bounded
//! timeout, and a typed failure carrying the upstream status and body when the
//! agent answers non-2xx. No retry logic lives here — failures propagate to
//! the caller, and the agent's own webhook redelivery is the natural retry.
//!
//! The [`AgentApi`] trait covers exactly the calls the orchestration state
//! machine makes, so tests can inject a fake; the concrete [`AgentClient`]
//! additionally exposes the rest of the admin surface (status, connections,
//! DID-exchange accept steps).

pub mod body;
pub mod client;
pub mod error;

use async_trait::async_trait;

pub use body::{offer_body, proof_request_body, ProofRequest, ProtocolVersion};
pub use client::{AgentClient, AgentConfig, CreatedInvitation};
pub use error::{AgentError, AgentResult};

/// One credential attribute in an offer preview
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialAttribute {
    pub name: String,
    pub value: String,
}

impl CredentialAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The agent operations the orchestration state machine depends on.
///
/// Injected as `Arc<dyn AgentApi>` so the state machine can be exercised
/// against a recording fake.
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Create a connection invitation; returns the agent's invitation record
    async fn create_invitation(
        &self,
        alias: Option<&str>,
        auto_accept: bool,
        multi_use: bool,
        use_public_did: bool,
    ) -> AgentResult<CreatedInvitation>;

    /// Send a basic message over an established connection
    async fn send_message(&self, connection_id: &str, content: &str) -> AgentResult<()>;

    /// Send a credential offer; returns the credential-exchange id
    async fn send_credential_offer(
        &self,
        version: ProtocolVersion,
        connection_id: &str,
        cred_def_id: &str,
        attributes: &[CredentialAttribute],
    ) -> AgentResult<String>;

    /// Manually issue a credential for an exchange the agent is not
    /// auto-issuing
    async fn issue_credential(
        &self,
        version: ProtocolVersion,
        credential_exchange_id: &str,
    ) -> AgentResult<()>;

    /// Send a proof request; returns the presentation-exchange id
    async fn send_proof_request(
        &self,
        version: ProtocolVersion,
        connection_id: &str,
        proof_request: &ProofRequest,
    ) -> AgentResult<String>;
}

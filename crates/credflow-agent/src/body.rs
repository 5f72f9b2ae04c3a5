//! Request body construction for the agent admin API
//!
//! The v1 and v2 credential/proof protocols differ in both URL and payload
//! shape, so body construction lives in free functions the client calls and
//! the tests exercise directly.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::CredentialAttribute;

const PREVIEW_TYPE_V1: &str = "https://didcomm.org/issue-credential/1.0/credential-preview";
const PREVIEW_TYPE_V2: &str = "https://didcomm.org/issue-credential/2.0/credential-preview";

/// Which generation of the credential/proof protocols a call targets.
///
/// Selectable per call site; the orchestrator carries one in its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl ProtocolVersion {
    /// Admin path for sending a credential offer
    pub fn offer_path(&self) -> &'static str {
        match self {
            Self::V1 => "/issue-credential/send-offer",
            Self::V2 => "/issue-credential-2.0/send-offer",
        }
    }

    /// Admin path for manually issuing a credential on an exchange record
    pub fn issue_path(&self, credential_exchange_id: &str) -> String {
        match self {
            Self::V1 => format!("/issue-credential/records/{credential_exchange_id}/issue"),
            Self::V2 => format!("/issue-credential-2.0/records/{credential_exchange_id}/issue"),
        }
    }

    /// Admin path for sending a proof request
    pub fn proof_request_path(&self) -> &'static str {
        match self {
            Self::V1 => "/present-proof/send-request",
            Self::V2 => "/present-proof-2.0/send-request",
        }
    }
}

/// An indy-style proof request: named attributes plus numeric predicates.
///
/// Referents are generated deterministically (`attr0_referent`, ...) so the
/// same request always serializes the same way.
#[derive(Debug, Clone, Serialize)]
pub struct ProofRequest {
    pub name: String,
    pub version: String,
    pub requested_attributes: BTreeMap<String, Value>,
    pub requested_predicates: BTreeMap<String, Value>,
}

impl ProofRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0".to_string(),
            requested_attributes: BTreeMap::new(),
            requested_predicates: BTreeMap::new(),
        }
    }

    /// Require the named attribute to be revealed
    pub fn attribute(mut self, name: &str) -> Self {
        let referent = format!("attr{}_referent", self.requested_attributes.len());
        self.requested_attributes
            .insert(referent, json!({ "name": name }));
        self
    }

    /// Require `name <p_type> p_value`, e.g. `expires >= 20260825`
    pub fn predicate(mut self, name: &str, p_type: &str, p_value: i64) -> Self {
        let referent = format!("pred{}_referent", self.requested_predicates.len());
        self.requested_predicates.insert(
            referent,
            json!({ "name": name, "p_type": p_type, "p_value": p_value }),
        );
        self
    }
}

/// Build the send-offer body for the given protocol version
pub fn offer_body(
    version: ProtocolVersion,
    connection_id: &str,
    cred_def_id: &str,
    attributes: &[CredentialAttribute],
) -> Value {
    let comment = format!("Offer on cred def id {cred_def_id}");
    match version {
        ProtocolVersion::V1 => json!({
            "connection_id": connection_id,
            "comment": comment,
            "auto_remove": false,
            "cred_def_id": cred_def_id,
            "credential_preview": {
                "@type": PREVIEW_TYPE_V1,
                "attributes": attributes,
            },
            "trace": false,
        }),
        ProtocolVersion::V2 => json!({
            "connection_id": connection_id,
            "comment": comment,
            "auto_remove": false,
            "credential_preview": {
                "@type": PREVIEW_TYPE_V2,
                "attributes": attributes,
            },
            "filter": { "indy": { "cred_def_id": cred_def_id } },
            "trace": false,
        }),
    }
}

/// Build the send-request body for a proof request.
///
/// v1 embeds the proof request directly; v2 wraps it under the named
/// `indy` format key.
pub fn proof_request_body(
    version: ProtocolVersion,
    connection_id: &str,
    proof_request: &ProofRequest,
) -> Value {
    match version {
        ProtocolVersion::V1 => json!({
            "connection_id": connection_id,
            "proof_request": proof_request,
        }),
        ProtocolVersion::V2 => json!({
            "connection_id": connection_id,
            "presentation_request": { "indy": proof_request },
        }),
    }
}

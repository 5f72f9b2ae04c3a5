//! Reqwest-backed agent admin client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::body::{offer_body, proof_request_body, ProofRequest, ProtocolVersion};
use crate::error::{AgentError, AgentResult};
use crate::{AgentApi, CredentialAttribute};

const DIDEXCHANGE_PROTOCOL: &str = "https://didcomm.org/didexchange/1.0";

/// Connection settings for the agent admin API
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the admin API, e.g. `http://localhost:8021`
    pub base_url: String,
    /// Admin API key, sent as `X-API-KEY` when present
    pub api_key: Option<String>,
    /// Per-request timeout; a slow agent must not pin a worker
    pub timeout: Duration,
}

impl AgentConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The agent's answer to a create-invitation call
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedInvitation {
    /// Present on DID-exchange invitations and older out-of-band agents
    pub connection_id: Option<String>,
    /// Agent-shortened URL, preferred for QR rendering
    pub invitation_url: Option<String>,
    /// The full invitation object, fallback rendering payload
    pub invitation: Option<Value>,
    /// Out-of-band invitation message id
    pub invi_msg_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OfferResponse {
    #[serde(alias = "credential_exchange_id")]
    cred_ex_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProofRequestResponse {
    #[serde(alias = "presentation_exchange_id")]
    pres_ex_id: Option<String>,
}

/// HTTP client for the Issuer Agent admin API.
///
/// Constructed once at process start and injected wherever agent calls are
/// made; it holds no state beyond the connection pool.
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AgentClient {
    /// Build a client from config. Fails only if the TLS backend cannot
    /// initialise.
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("X-API-KEY", key),
            None => req,
        }
    }

    async fn decode(resp: reqwest::Response) -> AgentResult<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        resp.json().await.map_err(AgentError::Transport)
    }

    async fn get(&self, path: &str) -> AgentResult<Value> {
        tracing::debug!(path, "agent GET");
        let resp = self.apply_key(self.http.get(self.url(path))).send().await?;
        Self::decode(resp).await
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        params: &[(&str, String)],
    ) -> AgentResult<Value> {
        tracing::debug!(path, "agent POST");
        let resp = self
            .apply_key(self.http.post(self.url(path)))
            .query(params)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Agent status and readiness
    pub async fn get_status(&self) -> AgentResult<Value> {
        self.get("/status").await
    }

    /// List all connections the agent knows about
    pub async fn list_connections(&self) -> AgentResult<Value> {
        self.get("/connections").await
    }

    /// Fetch one connection record
    pub async fn get_connection(&self, connection_id: &str) -> AgentResult<Value> {
        self.get(&format!("/connections/{connection_id}")).await
    }

    /// Receive an out-of-band invitation produced by another agent
    pub async fn receive_invitation(
        &self,
        invitation: &Value,
        auto_accept: bool,
    ) -> AgentResult<Value> {
        self.post(
            "/out-of-band/receive-invitation",
            invitation,
            &[("auto_accept", auto_accept.to_string())],
        )
        .await
    }

    /// Accept a connection invitation (DID-exchange step)
    pub async fn accept_invitation(
        &self,
        connection_id: &str,
        my_label: Option<&str>,
    ) -> AgentResult<Value> {
        let mut params = Vec::new();
        if let Some(label) = my_label {
            params.push(("my_label", label.to_string()));
        }
        self.post(
            &format!("/didexchange/{connection_id}/accept-invitation"),
            &json!({}),
            &params,
        )
        .await
    }

    /// Accept a connection request (DID-exchange step)
    pub async fn accept_request(&self, connection_id: &str) -> AgentResult<Value> {
        self.post(
            &format!("/didexchange/{connection_id}/accept-request"),
            &json!({}),
            &[],
        )
        .await
    }
}

#[async_trait]
impl AgentApi for AgentClient {
    async fn create_invitation(
        &self,
        alias: Option<&str>,
        auto_accept: bool,
        multi_use: bool,
        use_public_did: bool,
    ) -> AgentResult<CreatedInvitation> {
        let mut params = vec![
            ("auto_accept", auto_accept.to_string()),
            ("multi_use", multi_use.to_string()),
        ];
        if let Some(alias) = alias {
            params.push(("alias", alias.to_string()));
        }

        let body = json!({
            "handshake_protocols": [DIDEXCHANGE_PROTOCOL],
            "use_public_did": use_public_did,
        });

        let value = self
            .post("/out-of-band/create-invitation", &body, &params)
            .await?;
        serde_json::from_value(value).map_err(|e| AgentError::Decode(e.to_string()))
    }

    async fn send_message(&self, connection_id: &str, content: &str) -> AgentResult<()> {
        self.post(
            &format!("/connections/{connection_id}/send-message"),
            &json!({ "content": content }),
            &[],
        )
        .await?;
        Ok(())
    }

    async fn send_credential_offer(
        &self,
        version: ProtocolVersion,
        connection_id: &str,
        cred_def_id: &str,
        attributes: &[CredentialAttribute],
    ) -> AgentResult<String> {
        let body = offer_body(version, connection_id, cred_def_id, attributes);
        let value = self.post(version.offer_path(), &body, &[]).await?;
        let offer: OfferResponse =
            serde_json::from_value(value).map_err(|e| AgentError::Decode(e.to_string()))?;
        offer
            .cred_ex_id
            .ok_or(AgentError::MissingField("cred_ex_id"))
    }

    async fn issue_credential(
        &self,
        version: ProtocolVersion,
        credential_exchange_id: &str,
    ) -> AgentResult<()> {
        let comment = format!("Issuing credential, exchange {credential_exchange_id}");
        self.post(
            &version.issue_path(credential_exchange_id),
            &json!({ "comment": comment }),
            &[],
        )
        .await?;
        Ok(())
    }

    async fn send_proof_request(
        &self,
        version: ProtocolVersion,
        connection_id: &str,
        proof_request: &ProofRequest,
    ) -> AgentResult<String> {
        let body = proof_request_body(version, connection_id, proof_request);
        let value = self.post(version.proof_request_path(), &body, &[]).await?;
        let resp: ProofRequestResponse =
            serde_json::from_value(value).map_err(|e| AgentError::Decode(e.to_string()))?;
        resp.pres_ex_id
            .ok_or(AgentError::MissingField("pres_ex_id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = AgentClient::new(AgentConfig::new("http://localhost:8021/")).unwrap();
        assert_eq!(client.url("/status"), "http://localhost:8021/status");
    }

    #[test]
    fn offer_response_decodes_both_spellings() {
        let v1: OfferResponse =
            serde_json::from_str(r#"{"credential_exchange_id":"cx-1"}"#).unwrap();
        let v2: OfferResponse = serde_json::from_str(r#"{"cred_ex_id":"cx-1"}"#).unwrap();
        assert_eq!(v1.cred_ex_id.as_deref(), Some("cx-1"));
        assert_eq!(v2.cred_ex_id.as_deref(), Some("cx-1"));
    }

    #[test]
    fn created_invitation_tolerates_missing_fields() {
        let inv: CreatedInvitation = serde_json::from_str(
            r#"{"invitation_url":"http://agent/inv?oob=abc","invi_msg_id":"m-1"}"#,
        )
        .unwrap();
        assert!(inv.connection_id.is_none());
        assert_eq!(inv.invitation_url.as_deref(), Some("http://agent/inv?oob=abc"));
    }
}

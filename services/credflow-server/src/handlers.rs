//! Issuance API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use credflow_orchestrator::{OrchestratorError, Subject};
use credflow_types::ExchangeRecord;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub subject_id: String,
    pub given_name: String,
    pub family_name: String,
    /// Connection alias shown in the agent's admin UI
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record_id: Uuid,
    pub subject_id: String,
    pub state: String,
    pub connection_id: String,
    pub credential_exchange_id: String,
    pub presentation_exchange_id: String,
    pub revocation_registry_id: String,
    pub revocation_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ExchangeRecord> for RecordResponse {
    fn from(record: ExchangeRecord) -> Self {
        Self {
            record_id: record.id,
            subject_id: record.subject_id,
            state: record.state.to_string(),
            connection_id: record.connection_id,
            credential_exchange_id: record.credential_exchange_id,
            presentation_exchange_id: record.presentation_exchange_id,
            revocation_registry_id: record.revocation_registry_id,
            revocation_id: record.revocation_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProofRequestResponse {
    pub presentation_exchange_id: String,
}

/// POST /credentials - create an invitation and open an exchange record
pub async fn issue_credential(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueRequest>,
) -> ApiResult<(StatusCode, Json<credflow_orchestrator::IssuedInvitation>)> {
    if req.subject_id.trim().is_empty() {
        return Err(ApiError::InvalidParameter("subject_id"));
    }

    let subject = Subject {
        subject_id: req.subject_id,
        given_name: req.given_name,
        family_name: req.family_name,
    };

    let issued = state
        .orchestrator
        .issue_invitation(&subject, req.alias.as_deref())
        .await
        .map_err(|e| match e {
            // The flow cannot start without an invitation; report it as an
            // availability problem rather than a gateway one.
            OrchestratorError::Agent(inner) => ApiError::InvitationUnavailable(inner.to_string()),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(issued)))
}

/// GET /credentials/:record_id - exchange record status
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<Uuid>,
) -> ApiResult<Json<RecordResponse>> {
    let record = state
        .orchestrator
        .store()
        .get(record_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::RecordNotFound(record_id))?;
    Ok(Json(record.into()))
}

/// POST /credentials/:record_id/proof-request - ask the subject to prove
/// their credential
pub async fn request_proof(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<Uuid>,
) -> ApiResult<Json<ProofRequestResponse>> {
    let presentation_exchange_id = state.orchestrator.request_presentation(record_id).await?;
    Ok(Json(ProofRequestResponse {
        presentation_exchange_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

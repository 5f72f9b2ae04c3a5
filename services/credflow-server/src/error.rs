//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use credflow_orchestrator::OrchestratorError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid or missing api key")]
    Unauthorized,

    #[error("unknown webhook topic: {0}")]
    UnknownTopic(String),

    #[error("malformed request body")]
    MalformedBody,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("no exchange record {0}")]
    RecordNotFound(Uuid),

    #[error("proof request not allowed in state {0}")]
    ProofNotAllowed(String),

    #[error("invitation unavailable: {0}")]
    InvitationUnavailable(String),

    #[error("agent unavailable: {0}")]
    AgentUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body returned for every error
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownTopic(_) | Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::MalformedBody | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::ProofNotAllowed(_) => StatusCode::CONFLICT,
            Self::InvitationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::AgentUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Agent(e) => Self::AgentUnavailable(e.to_string()),
            OrchestratorError::Store(e) => Self::Internal(e.to_string()),
            OrchestratorError::NoRecord(id) => Self::RecordNotFound(id),
            OrchestratorError::PresentationNotAllowed { state } => {
                Self::ProofNotAllowed(state.to_string())
            }
            OrchestratorError::InvitationIncomplete(field) => {
                Self::InvitationUnavailable(format!("agent response missing {field}"))
            }
        }
    }
}

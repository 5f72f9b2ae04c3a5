//! Agent webhook sink
//!
//! The agent POSTs protocol state changes to `/topic/{topic}`. The
//! response code is a delivery receipt, not a business outcome: events the
//! state machine ignores still answer 200 so the agent does not retry them
//! forever. Only transport-level problems (bad auth, unknown topic, unusable
//! body, agent/store failure during the reaction) are errors.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use credflow_orchestrator::Disposition;
use credflow_types::{ConnectionEvent, CredentialEvent, PresentationEvent, WebhookTopic};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// What the sink did with a delivery
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub disposition: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
}

impl From<Disposition> for WebhookAck {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Advanced(_) => Self {
                disposition: "advanced",
                detail: None,
            },
            Disposition::Ignored(reason) => Self {
                disposition: "ignored",
                detail: Some(reason),
            },
        }
    }
}

fn check_api_key(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = &state.webhook_api_key else {
        return Ok(());
    };
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if presented != expected {
        warn!("webhook delivery with bad or missing api key");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

fn parse_event<T: DeserializeOwned>(topic: &str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| {
        warn!(topic, raw = body, error = %e, "unparseable webhook body");
        ApiError::MalformedBody
    })
}

/// POST /topic/:topic
pub async fn receive(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<WebhookAck>> {
    check_api_key(&state, &headers)?;

    let Some(known) = WebhookTopic::classify(&topic) else {
        info!(topic, "webhook for unrouted topic");
        return Err(ApiError::UnknownTopic(topic));
    };

    let disposition = match known {
        WebhookTopic::Ping => {
            return Ok(Json(WebhookAck {
                disposition: "ignored",
                detail: Some("ping"),
            }));
        }
        WebhookTopic::Connection => {
            let event: ConnectionEvent = parse_event(&topic, &body)?;
            state.orchestrator.handle_connection_event(&event).await?
        }
        WebhookTopic::CredentialExchange => {
            let event: CredentialEvent = parse_event(&topic, &body)?;
            state.orchestrator.handle_credential_event(&event).await?
        }
        WebhookTopic::PresentationExchange => {
            let event: PresentationEvent = parse_event(&topic, &body)?;
            state.orchestrator.handle_presentation_event(&event).await?
        }
    };

    Ok(Json(disposition.into()))
}

//! Route definitions

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;
use crate::webhook;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/credentials", post(handlers::issue_credential))
        .route("/credentials/:record_id", get(handlers::get_record))
        .route(
            "/credentials/:record_id/proof-request",
            post(handlers::request_proof),
        )
        .route("/topic/:topic", post(webhook::receive))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use credflow_agent::client::CreatedInvitation;
    use credflow_agent::{
        AgentApi, AgentResult, CredentialAttribute, ProofRequest, ProtocolVersion,
    };
    use credflow_orchestrator::{IssuanceSettings, Orchestrator};
    use credflow_store::MemoryStore;

    use crate::state::AppState;

    use super::create_router;

    struct StubAgent;

    #[async_trait]
    impl AgentApi for StubAgent {
        async fn create_invitation(
            &self,
            _alias: Option<&str>,
            _auto_accept: bool,
            _multi_use: bool,
            _use_public_did: bool,
        ) -> AgentResult<CreatedInvitation> {
            Ok(CreatedInvitation {
                connection_id: Some("c-1".to_string()),
                invitation_url: Some("http://agent.example/inv?oob=abc".to_string()),
                invitation: None,
                invi_msg_id: Some("m-1".to_string()),
            })
        }

        async fn send_message(&self, _connection_id: &str, _content: &str) -> AgentResult<()> {
            Ok(())
        }

        async fn send_credential_offer(
            &self,
            _version: ProtocolVersion,
            _connection_id: &str,
            _cred_def_id: &str,
            _attributes: &[CredentialAttribute],
        ) -> AgentResult<String> {
            Ok("cx-1".to_string())
        }

        async fn issue_credential(
            &self,
            _version: ProtocolVersion,
            _credential_exchange_id: &str,
        ) -> AgentResult<()> {
            Ok(())
        }

        async fn send_proof_request(
            &self,
            _version: ProtocolVersion,
            _connection_id: &str,
            _proof_request: &ProofRequest,
        ) -> AgentResult<String> {
            Ok("px-1".to_string())
        }
    }

    fn app(webhook_api_key: Option<&str>) -> axum::Router {
        let orchestrator = Orchestrator::new(
            Arc::new(StubAgent),
            Arc::new(MemoryStore::new()),
            IssuanceSettings {
                cred_def_id: "cred-def-9".to_string(),
                ..IssuanceSettings::default()
            },
        );
        create_router(Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
            webhook_api_key: webhook_api_key.map(str::to_string),
        }))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook(topic: &str, key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/topic/{topic}"))
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn webhook_rejects_bad_api_key() {
        let app = app(Some("secret"));

        let missing = app
            .clone()
            .oneshot(webhook("ping", None, "{}"))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app
            .clone()
            .oneshot(webhook("ping", Some("nope"), "{}"))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let right = app.oneshot(webhook("ping", Some("secret"), "{}")).await.unwrap();
        assert_eq!(right.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_topic_is_not_found() {
        let response = app(None)
            .oneshot(webhook("basicmessages", None, "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_webhook_body_is_bad_request() {
        let response = app(None)
            .oneshot(webhook("connections", None, "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_for_unknown_connection_is_acknowledged() {
        let body = json!({ "connection_id": "c-unknown", "state": "active" });
        let response = app(None)
            .oneshot(webhook("connections", None, &body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = json_body(response).await;
        assert_eq!(ack["disposition"], "ignored");
    }

    #[tokio::test]
    async fn didexchange_topic_routes_like_connections() {
        let body = json!({ "connection_id": "c-unknown", "state": "completed" });
        let response = app(None)
            .oneshot(webhook("didexchange", None, &body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn issue_then_fetch_record() {
        let app = app(None);

        let created = app
            .clone()
            .oneshot(post_json(
                "/credentials",
                json!({
                    "subject_id": "alice",
                    "given_name": "Alice",
                    "family_name": "Aster",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let issued = json_body(created).await;
        assert_eq!(issued["connection_id"], "c-1");
        let record_id = issued["record_id"].as_str().unwrap().to_string();

        let fetched = app
            .oneshot(
                Request::builder()
                    .uri(format!("/credentials/{record_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        let record = json_body(fetched).await;
        assert_eq!(record["state"], "INVITATION_SENT");
        assert_eq!(record["subject_id"], "alice");
    }

    #[tokio::test]
    async fn blank_subject_id_is_rejected() {
        let response = app(None)
            .oneshot(post_json(
                "/credentials",
                json!({
                    "subject_id": "  ",
                    "given_name": "Alice",
                    "family_name": "Aster",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn proof_request_before_issuance_is_conflict() {
        let app = app(None);

        let created = app
            .clone()
            .oneshot(post_json(
                "/credentials",
                json!({
                    "subject_id": "alice",
                    "given_name": "Alice",
                    "family_name": "Aster",
                }),
            ))
            .await
            .unwrap();
        let issued = json_body(created).await;
        let record_id = issued["record_id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(
                &format!("/credentials/{record_id}/proof-request"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let response = app(None)
            .oneshot(
                Request::builder()
                    .uri("/credentials/00000000-0000-0000-0000-000000000000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_issuance_flow_over_http() {
        let app = app(Some("secret"));

        let created = app
            .clone()
            .oneshot(post_json(
                "/credentials",
                json!({
                    "subject_id": "alice",
                    "given_name": "Alice",
                    "family_name": "Aster",
                }),
            ))
            .await
            .unwrap();
        let issued = json_body(created).await;
        let record_id = issued["record_id"].as_str().unwrap().to_string();

        let active = json!({ "connection_id": "c-1", "state": "active" });
        let response = app
            .clone()
            .oneshot(webhook("connections", Some("secret"), &active.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = json_body(response).await;
        assert_eq!(ack["disposition"], "advanced");

        let acked = json!({
            "connection_id": "c-1",
            "state": "credential_acked",
            "cred_ex_id": "cx-1",
        });
        let response = app
            .clone()
            .oneshot(webhook(
                "issue_credential_v2_0",
                Some("secret"),
                &acked.to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let fetched = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/credentials/{record_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let record = json_body(fetched).await;
        assert_eq!(record["state"], "CREDENTIAL_ISSUED");

        let proof = app
            .oneshot(post_json(
                &format!("/credentials/{record_id}/proof-request"),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(proof.status(), StatusCode::OK);
        let proof_body = json_body(proof).await;
        assert_eq!(proof_body["presentation_exchange_id"], "px-1");
    }
}

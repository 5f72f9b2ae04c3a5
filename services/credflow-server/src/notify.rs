//! External lifecycle notifications
//!
//! Fire-and-forget POSTs to a configured endpoint when an exchange crosses a
//! coarse milestone. Failures are logged and dropped; notification delivery
//! never gates record state.

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use credflow_orchestrator::EventNotifier;

pub struct HttpNotifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EventNotifier for HttpNotifier {
    async fn notify(&self, connection_id: &str, event_type: &str) {
        let body = json!({
            "connection_id": connection_id,
            "event_type": event_type,
        });
        let result = self.http.post(&self.endpoint).json(&body).send().await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                warn!(
                    endpoint = %self.endpoint,
                    status = resp.status().as_u16(),
                    event_type,
                    "notification rejected"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(endpoint = %self.endpoint, event_type, error = %e, "notification failed");
            }
        }
    }
}

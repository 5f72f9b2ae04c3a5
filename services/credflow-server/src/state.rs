//! Shared application state

use std::sync::Arc;

use credflow_orchestrator::Orchestrator;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Shared secret the agent must present on webhook deliveries; `None`
    /// disables the check (local development only)
    pub webhook_api_key: Option<String>,
}

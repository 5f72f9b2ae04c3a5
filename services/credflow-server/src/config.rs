//! Server configuration
//!
//! Everything is sourced from the environment (with CLI overrides applied in
//! `main`); there is deliberately no config-file layer, deployments of this
//! service are container-shaped.

use std::net::SocketAddr;
use std::time::Duration;

use credflow_agent::ProtocolVersion;
use credflow_orchestrator::IssuanceSettings;

/// Full runtime configuration for the server process
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Agent admin API base URL
    pub agent_url: String,

    /// Admin API key for the agent, if the agent requires one
    pub agent_api_key: Option<String>,

    /// Per-request timeout for agent calls in seconds
    pub agent_timeout_secs: u64,

    /// Shared secret the agent must present on webhook deliveries
    pub webhook_api_key: Option<String>,

    /// SQLite URL; absent means the in-memory store
    pub database_url: Option<String>,

    /// Credential definition offers are made against
    pub cred_def_id: String,

    /// Issue-credential protocol generation, "v1" or "v2"
    pub protocol: String,

    /// Whether the agent is configured to auto-issue on request
    pub auto_issue: bool,

    /// YYYYMMDD expiry stamped into each credential
    pub credential_expires: String,

    /// Endpoint for coarse lifecycle notifications, if any
    pub notify_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Log format, "json" or "pretty"
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            agent_url: "http://localhost:8021".to_string(),
            agent_api_key: None,
            agent_timeout_secs: 30,
            webhook_api_key: None,
            database_url: None,
            cred_def_id: String::new(),
            protocol: "v2".to_string(),
            auto_issue: false,
            credential_expires: "20991231".to_string(),
            notify_url: None,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        match self.protocol.as_str() {
            "v1" | "1" | "1.0" => ProtocolVersion::V1,
            _ => ProtocolVersion::V2,
        }
    }

    pub fn issuance_settings(&self) -> IssuanceSettings {
        IssuanceSettings {
            cred_def_id: self.cred_def_id.clone(),
            protocol: self.protocol_version(),
            auto_issue: self.auto_issue,
            credential_expires: self.credential_expires.clone(),
            ..IssuanceSettings::default()
        }
    }
}

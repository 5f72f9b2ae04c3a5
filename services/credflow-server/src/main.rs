//! credflow server
//!
//! HTTP surface for credential issuance: a small REST API for starting
//! exchanges and querying their status, plus the webhook sink the agent
//! reports protocol state changes to.
//!
//! ```bash
//! # Local development against an agent on the default admin port
//! credflow-server --cred-def-id <id>
//!
//! # Everything can come from the environment instead
//! CREDFLOW_AGENT_URL=http://agent:8021 DATABASE_URL=sqlite://credflow.db credflow-server
//! ```

mod config;
mod error;
mod handlers;
mod notify;
mod routes;
mod state;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use credflow_agent::{AgentClient, AgentConfig};
use credflow_orchestrator::Orchestrator;
use credflow_store::{MemoryStore, RecordStore, SqliteStore};

use crate::config::ServerConfig;
use crate::notify::HttpNotifier;
use crate::state::AppState;

/// credflow server - credential issuance API and agent webhook sink
#[derive(Parser, Debug)]
#[command(name = "credflow-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "CREDFLOW_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "CREDFLOW_PORT", default_value_t = 4000)]
    port: u16,

    /// Agent admin API base URL
    #[arg(long, env = "CREDFLOW_AGENT_URL", default_value = "http://localhost:8021")]
    agent_url: String,

    /// Admin API key for the agent
    #[arg(long, env = "CREDFLOW_AGENT_API_KEY")]
    agent_api_key: Option<String>,

    /// Agent request timeout in seconds
    #[arg(long, env = "CREDFLOW_AGENT_TIMEOUT_SECS", default_value_t = 30)]
    agent_timeout_secs: u64,

    /// Shared secret the agent presents on webhook deliveries
    #[arg(long, env = "CREDFLOW_WEBHOOK_API_KEY")]
    webhook_api_key: Option<String>,

    /// SQLite URL, e.g. sqlite://credflow.db; omit for the in-memory store
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Credential definition offers are made against
    #[arg(long, env = "CREDFLOW_CRED_DEF_ID", default_value = "")]
    cred_def_id: String,

    /// Issue-credential protocol generation (v1, v2)
    #[arg(long, env = "CREDFLOW_PROTOCOL", default_value = "v2")]
    protocol: String,

    /// Whether the agent auto-issues on credential request
    #[arg(long, env = "CREDFLOW_AUTO_ISSUE")]
    auto_issue: bool,

    /// YYYYMMDD expiry stamped into each credential
    #[arg(long, env = "CREDFLOW_CREDENTIAL_EXPIRES", default_value = "20991231")]
    credential_expires: String,

    /// Endpoint for coarse lifecycle notifications
    #[arg(long, env = "CREDFLOW_NOTIFY_URL")]
    notify_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "CREDFLOW_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "CREDFLOW_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            agent_url: self.agent_url,
            agent_api_key: self.agent_api_key,
            agent_timeout_secs: self.agent_timeout_secs,
            webhook_api_key: self.webhook_api_key,
            database_url: self.database_url,
            cred_def_id: self.cred_def_id,
            protocol: self.protocol,
            auto_issue: self.auto_issue,
            credential_expires: self.credential_expires,
            notify_url: self.notify_url,
            log_level: self.log_level,
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Args::parse().into_config();

    init_logging(&config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting credflow server"
    );

    if config.cred_def_id.is_empty() {
        tracing::warn!("no credential definition configured; offers will be rejected by the agent");
    }
    if config.webhook_api_key.is_none() {
        tracing::warn!("webhook api key not set; webhook deliveries are unauthenticated");
    }

    let store = init_store(&config).await?;

    let agent = AgentClient::new(AgentConfig {
        base_url: config.agent_url.clone(),
        api_key: config.agent_api_key.clone(),
        timeout: config.agent_timeout(),
    })?;

    let mut orchestrator = Orchestrator::new(Arc::new(agent), store, config.issuance_settings());
    if let Some(notify_url) = &config.notify_url {
        tracing::info!(endpoint = %notify_url, "lifecycle notifications enabled");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        orchestrator = orchestrator.with_notifier(Arc::new(HttpNotifier::new(http, notify_url)));
    }

    let state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        webhook_api_key: config.webhook_api_key.clone(),
    });
    let app = routes::create_router(state);

    let addr = config.socket_addr()?;
    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    match config.log_format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().with_target(true)).init(),
    }
    Ok(())
}

async fn init_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!(url = %url, "Using SQLite record store");
            Ok(Arc::new(SqliteStore::connect(url).await?))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; records will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

//! Agent client error types

use thiserror::Error;

/// Failures talking to the Issuer Agent admin API
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent unreachable, connection refused, timeout, etc.
    #[error("agent transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The agent answered, but with a non-2xx status. The upstream status
    /// and body are kept for diagnostics.
    #[error("agent returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The agent answered 2xx but the body did not decode as expected
    #[error("unexpected agent response: {0}")]
    Decode(String),

    /// A field this client requires was absent from the agent's response
    #[error("agent response missing field: {0}")]
    MissingField(&'static str),
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

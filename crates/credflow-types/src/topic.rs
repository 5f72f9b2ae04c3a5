//! Webhook topic classification

use std::fmt;

/// The webhook topics this system understands.
///
/// The agent posts to `/topic/{topic}`; v1 and v2 protocol topic names both
/// map to the same handler. Anything else is `Unknown` and answered with
/// "not found" without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    /// `connections` or `didexchange`
    Connection,
    /// `issue_credential` or `issue_credential_v2_0`
    CredentialExchange,
    /// `present_proof` or `present_proof_v2_0`
    PresentationExchange,
    /// `ping` / trust ping keepalives
    Ping,
}

impl WebhookTopic {
    /// Classify a raw topic path segment
    pub fn classify(topic: &str) -> Option<Self> {
        match topic {
            "connections" | "didexchange" => Some(Self::Connection),
            "issue_credential" | "issue_credential_v2_0" => Some(Self::CredentialExchange),
            "present_proof" | "present_proof_v2_0" => Some(Self::PresentationExchange),
            "ping" | "trust_ping" => Some(Self::Ping),
            _ => None,
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "connection",
            Self::CredentialExchange => "credential-exchange",
            Self::PresentationExchange => "presentation-exchange",
            Self::Ping => "ping",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_topics() {
        assert_eq!(
            WebhookTopic::classify("connections"),
            Some(WebhookTopic::Connection)
        );
        assert_eq!(
            WebhookTopic::classify("didexchange"),
            Some(WebhookTopic::Connection)
        );
        assert_eq!(
            WebhookTopic::classify("issue_credential_v2_0"),
            Some(WebhookTopic::CredentialExchange)
        );
        assert_eq!(
            WebhookTopic::classify("present_proof"),
            Some(WebhookTopic::PresentationExchange)
        );
        assert_eq!(WebhookTopic::classify("ping"), Some(WebhookTopic::Ping));
    }

    #[test]
    fn unknown_topic_is_none() {
        assert_eq!(WebhookTopic::classify("endorse_transaction"), None);
        assert_eq!(WebhookTopic::classify(""), None);
    }
}

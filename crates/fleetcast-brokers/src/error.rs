//! Error types for the fleetcast-brokers crate.

use thiserror::Error;

/// Errors that can occur while building or sending envelopes.
#[derive(Debug, Error)]
pub enum BrokerError {
    // Configuration errors (permanent, no retry)
    /// Required configuration variable is missing.
    #[error("Configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("Configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    // Envelope errors
    /// Event content could not be turned into an envelope.
    #[error("Failed to build envelope for {event_type}: {cause}")]
    EnvelopeBuild { event_type: String, cause: String },

    /// Envelope has no routing key.
    #[error("topicID is not present on the envelope header")]
    MissingTopicId,

    /// Envelope could not be encoded for the transport.
    #[error("Failed to encode envelope: {cause}")]
    Encode { cause: String },

    /// Envelope payload does not have the shape the broker expects.
    #[error("Unexpected message for {event_type}: {cause}")]
    UnexpectedMessage { event_type: String, cause: String },

    // Transport errors
    /// Destination topic does not exist.
    #[error("topic {topic} does not exist in {scope}")]
    TopicNotFound { topic: String, scope: String },

    /// Failed to reach the transport.
    #[error("Connection to {endpoint} failed: {cause}")]
    ConnectionFailed { endpoint: String, cause: String },

    /// Transport rejected or could not deliver the message.
    #[error("Failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },
}

impl BrokerError {
    /// Returns true if a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrokerError::ConnectionFailed { .. } | BrokerError::PublishFailed { .. }
        )
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BrokerError::ConfigMissing { .. } | BrokerError::ConfigInvalid { .. }
        )
    }
}

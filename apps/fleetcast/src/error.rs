//! Error types for the fleetcast binary.

use fleetcast_broadcaster::BroadcastError;
use fleetcast_brokers::BrokerError;
use thiserror::Error;

/// Fatal errors; the process exits with status 1.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("Failed to read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("the kafka broker requires fleetcast to be built with the `kafka` feature")]
    KafkaDisabled,

    #[error("HTTP server stopped unexpectedly: {0}")]
    Server(String),
}

/// A watch notification line that can't be dispatched.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid notification: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {kind} object: {cause}")]
    InvalidObject { kind: String, cause: String },

    #[error("update notification for {kind} has no old_object")]
    MissingOldObject { kind: String },
}

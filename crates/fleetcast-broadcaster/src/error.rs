//! Error types for the fleetcast-broadcaster crate.

use fleetcast_brokers::BrokerError;
use thiserror::Error;

/// Errors returned to the watch layer or at startup.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Building or sending the envelope failed. The watch layer should retry.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The broadcaster was built without any watched kind.
    #[error("can't build a broadcaster without watched resource kinds")]
    NoWatchers,

    /// A watched kind has no registered event factory.
    #[error("no event factory registered for watched kind {kind}")]
    UnregisteredKind { kind: String },
}

impl BroadcastError {
    /// Returns true if a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BroadcastError::Broker(e) => e.is_transient(),
            _ => false,
        }
    }
}

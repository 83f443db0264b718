//! Error types for the fleetcast-events crate.

use thiserror::Error;

/// Errors that can occur while turning resources into envelopes.
#[derive(Debug, Error)]
pub enum EventError {
    /// A resource could not be converted to its JSON form.
    #[error("Failed to serialize {kind} resource: {cause}")]
    SerializationFailed { kind: String, cause: String },

    /// An envelope could not be encoded for the wire.
    #[error("Failed to encode envelope: {cause}")]
    EncodeFailed { cause: String },

    /// Bytes could not be decoded back into an envelope.
    #[error("Invalid envelope: {reason}")]
    InvalidEnvelope { reason: String },
}

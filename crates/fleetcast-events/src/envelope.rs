//! Wire-ready envelope handed to brokers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;
use crate::event::Event;

/// Header carrying the event type label. Set by every broker.
pub const EVENT_TYPE_HEADER_KEY: &str = "event_type";

/// Header carrying the destination topic for topic-routed brokers.
pub const TOPIC_ID_HEADER_KEY: &str = "topic_id";

/// Envelope metadata. Keys are unique; the namespace is broker-defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub headers: BTreeMap<String, String>,
}

/// Header plus payload, created fresh for every publish.
///
/// Encodes as `{"header": {"headers": {..}}, "message": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    pub message: Value,
}

impl Envelope {
    /// Create an envelope with an empty header.
    #[must_use]
    pub fn new(message: Value) -> Self {
        Self {
            header: Header::default(),
            message,
        }
    }

    /// Create an envelope carrying the JSON form of the event's content.
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        let message = event.message().content().to_json()?;
        Ok(Self::new(message))
    }

    /// Set a header, replacing any previous value for `key`.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.header.headers.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(key, value);
        self
    }

    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.header.headers.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.header(EVENT_TYPE_HEADER_KEY)
    }

    #[must_use]
    pub fn topic_id(&self) -> Option<&str> {
        self.header(TOPIC_ID_HEADER_KEY)
    }

    /// Encode to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::EncodeFailed {
            cause: e.to_string(),
        })
    }

    /// Decode from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|e| EventError::InvalidEnvelope {
            reason: e.to_string(),
        })
    }
}

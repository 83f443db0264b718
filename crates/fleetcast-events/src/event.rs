//! Event source and type vocabulary, and the [`Event`] value itself.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// The watch callback that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    OnAdd,
    OnUpdate,
    OnDelete,
}

impl EventSource {
    /// Stable label used for routing and logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnAdd => "OnAdd",
            Self::OnUpdate => "OnUpdate",
            Self::OnDelete => "OnDelete",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broker routing label, one per resource kind and source.
///
/// The string form is stable: brokers use it as a header value and as a
/// lookup key, e.g. `"gameserver.events.added"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// Create an event type from a static label, usable in `const` items.
    #[must_use]
    pub const fn from_static(label: &'static str) -> Self {
        Self(Cow::Borrowed(label))
    }

    /// Create an event type from an owned label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A classified resource change.
///
/// Events are immutable: source and type are fixed at construction and the
/// wrapped [`Message`] is handed back unchanged.
#[derive(Debug, Clone)]
pub struct Event {
    source: EventSource,
    event_type: EventType,
    message: Message,
}

impl Event {
    #[must_use]
    pub fn new(source: EventSource, event_type: EventType, message: Message) -> Self {
        Self {
            source,
            event_type,
            message,
        }
    }

    #[must_use]
    pub fn source(&self) -> EventSource {
        self.source
    }

    #[must_use]
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    #[must_use]
    pub fn into_message(self) -> Message {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::GameServer;

    #[test]
    fn test_event_source_labels() {
        assert_eq!(EventSource::OnAdd.to_string(), "OnAdd");
        assert_eq!(EventSource::OnUpdate.to_string(), "OnUpdate");
        assert_eq!(EventSource::OnDelete.to_string(), "OnDelete");
    }

    #[test]
    fn test_event_type_static_and_owned_compare_equal() {
        const ADDED: EventType = EventType::from_static("gameserver.events.added");
        assert_eq!(ADDED, EventType::new("gameserver.events.added"));
        assert_eq!(ADDED.to_string(), "gameserver.events.added");
    }

    #[test]
    fn test_event_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&EventType::from_static("fleet.events.updated")).unwrap();
        assert_eq!(json, "\"fleet.events.updated\"");
    }

    #[test]
    fn test_event_accessors() {
        let message = Message::object(GameServer::new("default", "gs-1"));
        let event = Event::new(
            EventSource::OnDelete,
            EventType::from_static("gameserver.events.deleted"),
            message,
        );

        assert_eq!(event.source(), EventSource::OnDelete);
        assert_eq!(event.event_type().as_str(), "gameserver.events.deleted");
        assert_eq!(event.message().content().kind(), "GameServer");
    }
}

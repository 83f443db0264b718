//! Game server resource and its lifecycle events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventSource, EventType};
use crate::message::{Message, Resource};
use crate::registry::EventFactoryRegistry;

pub const GAMESERVER_EVENT_ADDED: EventType = EventType::from_static("gameserver.events.added");
pub const GAMESERVER_EVENT_UPDATED: EventType =
    EventType::from_static("gameserver.events.updated");
pub const GAMESERVER_EVENT_DELETED: EventType =
    EventType::from_static("gameserver.events.deleted");

/// Lifecycle state of a game server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameServerState {
    PortAllocation,
    #[default]
    Creating,
    Starting,
    Scheduled,
    RequestReady,
    Ready,
    Shutdown,
    Error,
    Unhealthy,
    Reserved,
    Allocated,
}

impl GameServerState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PortAllocation => "PortAllocation",
            Self::Creating => "Creating",
            Self::Starting => "Starting",
            Self::Scheduled => "Scheduled",
            Self::RequestReady => "RequestReady",
            Self::Ready => "Ready",
            Self::Shutdown => "Shutdown",
            Self::Error => "Error",
            Self::Unhealthy => "Unhealthy",
            Self::Reserved => "Reserved",
            Self::Allocated => "Allocated",
        }
    }
}

impl fmt::Display for GameServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServerPort {
    pub name: String,
    pub port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameServerStatus {
    #[serde(default)]
    pub state: GameServerState,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub ports: Vec<GameServerPort>,
}

/// A dedicated game server instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServer {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub status: GameServerStatus,
}

impl GameServer {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: GameServerState) -> Self {
        self.status.state = state;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// `namespace/name`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.state == GameServerState::Ready
    }

    /// First allocated port, if any.
    #[must_use]
    pub fn port(&self) -> Option<i32> {
        self.status.ports.first().map(|p| p.port)
    }
}

impl Resource for GameServer {
    const KIND: &'static str = "GameServer";
}

pub fn added(message: Message) -> Event {
    Event::new(EventSource::OnAdd, GAMESERVER_EVENT_ADDED, message)
}

pub fn updated(message: Message) -> Event {
    Event::new(EventSource::OnUpdate, GAMESERVER_EVENT_UPDATED, message)
}

pub fn deleted(message: Message) -> Event {
    Event::new(EventSource::OnDelete, GAMESERVER_EVENT_DELETED, message)
}

pub fn register(registry: &mut EventFactoryRegistry) {
    registry.register_resource::<GameServer>(added, updated, deleted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let gs: GameServer = serde_json::from_value(json!({"name": "gs-1"})).unwrap();
        assert_eq!(gs.name, "gs-1");
        assert_eq!(gs.status.state, GameServerState::Creating);
        assert!(gs.port().is_none());
    }

    #[test]
    fn test_status_field_names() {
        let mut gs = GameServer::new("default", "gs-1").with_state(GameServerState::Ready);
        gs.status.node_name = "node-a".to_string();
        gs.status.ports.push(GameServerPort {
            name: "default".to_string(),
            port: 7654,
        });

        let value = serde_json::to_value(&gs).unwrap();
        assert_eq!(value["status"]["state"], "Ready");
        assert_eq!(value["status"]["nodeName"], "node-a");
        assert_eq!(value["status"]["ports"][0]["port"], 7654);
    }

    #[test]
    fn test_key_and_readiness() {
        let gs = GameServer::new("games", "gs-1").with_state(GameServerState::Allocated);
        assert_eq!(gs.key(), "games/gs-1");
        assert!(!gs.is_ready());
    }

    #[test]
    fn test_constructors_bind_source_and_type() {
        let event = updated(Message::object(GameServer::new("default", "gs-1")));
        assert_eq!(event.source(), EventSource::OnUpdate);
        assert_eq!(event.event_type(), &GAMESERVER_EVENT_UPDATED);
    }
}

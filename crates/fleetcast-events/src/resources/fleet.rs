//! Fleet resource and its lifecycle events.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventSource, EventType};
use crate::message::{Message, Resource};
use crate::registry::EventFactoryRegistry;

pub const FLEET_EVENT_ADDED: EventType = EventType::from_static("fleet.events.added");
pub const FLEET_EVENT_UPDATED: EventType = EventType::from_static("fleet.events.updated");
pub const FLEET_EVENT_DELETED: EventType = EventType::from_static("fleet.events.deleted");

/// Replica counts reported for a fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStatus {
    #[serde(default)]
    pub replicas: i32,
    #[serde(default)]
    pub ready_replicas: i32,
    #[serde(default)]
    pub reserved_replicas: i32,
    #[serde(default)]
    pub allocated_replicas: i32,
}

/// A set of warm game servers managed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Desired number of game servers.
    #[serde(default)]
    pub replicas: i32,
    #[serde(default)]
    pub status: FleetStatus,
}

impl Fleet {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }
}

impl Resource for Fleet {
    const KIND: &'static str = "Fleet";
}

pub fn added(message: Message) -> Event {
    Event::new(EventSource::OnAdd, FLEET_EVENT_ADDED, message)
}

pub fn updated(message: Message) -> Event {
    Event::new(EventSource::OnUpdate, FLEET_EVENT_UPDATED, message)
}

pub fn deleted(message: Message) -> Event {
    Event::new(EventSource::OnDelete, FLEET_EVENT_DELETED, message)
}

pub fn register(registry: &mut EventFactoryRegistry) {
    registry.register_resource::<Fleet>(added, updated, deleted);
}

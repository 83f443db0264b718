//! Translates watch notifications into published envelopes.

use std::sync::Arc;

use async_trait::async_trait;
use fleetcast_brokers::Broker;
use fleetcast_events::{Event, EventFactoryRegistry, Message, Resource, ResourceRef};
use tracing::{debug, error, instrument, warn};

use crate::error::BroadcastError;
use crate::handler::EventHandler;

/// Receives add/update/delete notifications and publishes them through a
/// single broker.
///
/// Holds no mutable state: the registry is read-only and the broker is fixed
/// at construction, so handlers may be called concurrently.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<EventFactoryRegistry>,
    broker: Option<Arc<dyn Broker>>,
    watched: Vec<String>,
}

impl Broadcaster {
    /// Create a broadcaster. Without a broker every event is dropped with a
    /// warning.
    #[must_use]
    pub fn new(registry: Arc<EventFactoryRegistry>, broker: Option<Arc<dyn Broker>>) -> Self {
        Self {
            registry,
            broker,
            watched: Vec::new(),
        }
    }

    #[must_use]
    pub fn builder(registry: Arc<EventFactoryRegistry>) -> BroadcasterBuilder {
        BroadcasterBuilder::new(registry)
    }

    #[must_use]
    pub fn registry(&self) -> &EventFactoryRegistry {
        &self.registry
    }

    #[must_use]
    pub fn broker(&self) -> Option<&Arc<dyn Broker>> {
        self.broker.as_ref()
    }

    /// Kinds declared through the builder.
    #[must_use]
    pub fn watched_kinds(&self) -> &[String] {
        &self.watched
    }

    /// Build the envelope for `event` and send it. Failures are returned as
    /// is; no retry happens here.
    #[instrument(skip_all, fields(event_type = %event.event_type(), source = %event.source()))]
    pub async fn publish(&self, event: Event) -> Result<(), BroadcastError> {
        let Some(broker) = &self.broker else {
            warn!("Broker is not available for the broadcaster, message will not be published");
            return Ok(());
        };

        let envelope = broker.build_envelope(&event).map_err(|e| {
            error!(broker = broker.name(), error = %e, "Error building envelope");
            e
        })?;

        broker.send_message(envelope).await.map_err(|e| {
            error!(broker = broker.name(), error = %e, "Error sending envelope");
            e
        })?;

        Ok(())
    }

    async fn dispatch(&self, event: Option<Event>) -> Result<(), BroadcastError> {
        match event {
            Some(event) => self.publish(event).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EventHandler for Broadcaster {
    async fn on_add(&self, obj: ResourceRef) -> Result<(), BroadcastError> {
        debug!(kind = %obj.kind(), "OnAdd");
        let event = self.registry.resolve_added(Message::from_ref(obj));
        self.dispatch(event).await
    }

    async fn on_update(
        &self,
        old_obj: ResourceRef,
        new_obj: ResourceRef,
    ) -> Result<(), BroadcastError> {
        debug!(kind = %new_obj.kind(), "OnUpdate");
        let event = self
            .registry
            .resolve_updated(Message::update(old_obj, new_obj));
        self.dispatch(event).await
    }

    async fn on_delete(&self, obj: ResourceRef) -> Result<(), BroadcastError> {
        debug!(kind = %obj.kind(), "OnDelete");
        let event = self.registry.resolve_deleted(Message::from_ref(obj));
        self.dispatch(event).await
    }
}

/// Builder validating the broadcaster setup before any dispatch happens.
///
/// ```rust
/// use std::sync::Arc;
/// use fleetcast_broadcaster::Broadcaster;
/// use fleetcast_brokers::stdout::StdoutBroker;
/// use fleetcast_events::EventFactoryRegistry;
/// use fleetcast_events::resources::{Fleet, GameServer};
///
/// let broadcaster = Broadcaster::builder(Arc::new(EventFactoryRegistry::with_defaults()))
///     .with_broker(StdoutBroker::new())
///     .watch::<GameServer>()
///     .watch::<Fleet>()
///     .build()
///     .unwrap();
///
/// assert_eq!(broadcaster.watched_kinds(), ["GameServer", "Fleet"]);
/// ```
pub struct BroadcasterBuilder {
    registry: Arc<EventFactoryRegistry>,
    broker: Option<Arc<dyn Broker>>,
    watched: Vec<String>,
}

impl BroadcasterBuilder {
    #[must_use]
    pub fn new(registry: Arc<EventFactoryRegistry>) -> Self {
        Self {
            registry,
            broker: None,
            watched: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_broker(self, broker: impl Broker + 'static) -> Self {
        self.with_shared_broker(Arc::new(broker))
    }

    #[must_use]
    pub fn with_shared_broker(mut self, broker: Arc<dyn Broker>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Declare a watched resource type.
    #[must_use]
    pub fn watch<R: Resource>(self) -> Self {
        self.watch_kind(R::KIND)
    }

    /// Declare a watched resource kind.
    #[must_use]
    pub fn watch_kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !self.watched.contains(&kind) {
            self.watched.push(kind);
        }
        self
    }

    /// Fails if nothing is watched or a watched kind has no event factory.
    pub fn build(self) -> Result<Broadcaster, BroadcastError> {
        if self.watched.is_empty() {
            return Err(BroadcastError::NoWatchers);
        }

        if let Some(kind) = self.watched.iter().find(|k| !self.registry.contains(k)) {
            return Err(BroadcastError::UnregisteredKind { kind: kind.clone() });
        }

        if self.broker.is_none() {
            warn!("Broadcaster built without a broker, events will be dropped");
        }

        Ok(Broadcaster {
            registry: self.registry,
            broker: self.broker,
            watched: self.watched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetcast_events::resources::GameServer;

    #[test]
    fn test_build_requires_watchers() {
        let result = Broadcaster::builder(Arc::new(EventFactoryRegistry::with_defaults())).build();
        assert!(matches!(result, Err(BroadcastError::NoWatchers)));
    }

    #[test]
    fn test_build_rejects_unregistered_watched_kind() {
        let result = Broadcaster::builder(Arc::new(EventFactoryRegistry::with_defaults()))
            .watch::<GameServer>()
            .watch_kind("Lobby")
            .build();

        match result {
            Err(BroadcastError::UnregisteredKind { kind }) => assert_eq!(kind, "Lobby"),
            _ => panic!("Expected UnregisteredKind error"),
        }
    }

    #[test]
    fn test_watch_kind_deduplicates() {
        let broadcaster = Broadcaster::builder(Arc::new(EventFactoryRegistry::with_defaults()))
            .watch::<GameServer>()
            .watch_kind("GameServer")
            .build()
            .unwrap();

        assert_eq!(broadcaster.watched_kinds(), ["GameServer"]);
        assert!(broadcaster.broker().is_none());
    }
}

//! Per-kind event factory registry.

use std::collections::HashMap;

use tracing::debug;

use crate::event::Event;
use crate::message::{Message, Resource};
use crate::resources;

/// Constructor turning a message into a typed event.
pub type EventBuilder = fn(Message) -> Event;

/// Constructors for the three lifecycle events of one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct EventFactory {
    pub on_added: EventBuilder,
    pub on_updated: EventBuilder,
    pub on_deleted: EventBuilder,
}

/// Maps resource kinds to their [`EventFactory`].
///
/// Built once at startup and shared read-only afterwards. Resolving a
/// message whose kind has no factory yields `None`: callers treat that as
/// "nothing to publish".
#[derive(Debug, Clone, Default)]
pub struct EventFactoryRegistry {
    factories: HashMap<String, EventFactory>,
}

impl EventFactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in resource kinds registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        resources::gameserver::register(&mut registry);
        resources::fleet::register(&mut registry);
        registry
    }

    /// Register the factory for `kind`. A later registration replaces an
    /// earlier one.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        on_added: EventBuilder,
        on_updated: EventBuilder,
        on_deleted: EventBuilder,
    ) -> &mut Self {
        let kind = kind.into();
        let factory = EventFactory {
            on_added,
            on_updated,
            on_deleted,
        };

        if self.factories.insert(kind.clone(), factory).is_some() {
            debug!(kind = %kind, "Replaced event factory");
        } else {
            debug!(kind = %kind, "Registered event factory");
        }

        self
    }

    /// Register the factory for a statically typed resource.
    pub fn register_resource<R: Resource>(
        &mut self,
        on_added: EventBuilder,
        on_updated: EventBuilder,
        on_deleted: EventBuilder,
    ) -> &mut Self {
        self.register(R::KIND, on_added, on_updated, on_deleted)
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&EventFactory> {
        self.factories.get(kind)
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, in no particular order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Resolve an add notification.
    #[must_use]
    pub fn resolve_added(&self, message: Message) -> Option<Event> {
        let factory = self.factory_for(&message)?;
        Some((factory.on_added)(message))
    }

    /// Resolve an update notification. The kind is taken from the new object.
    #[must_use]
    pub fn resolve_updated(&self, message: Message) -> Option<Event> {
        let factory = self.factory_for(&message)?;
        Some((factory.on_updated)(message))
    }

    /// Resolve a delete notification.
    #[must_use]
    pub fn resolve_deleted(&self, message: Message) -> Option<Event> {
        let factory = self.factory_for(&message)?;
        Some((factory.on_deleted)(message))
    }

    fn factory_for(&self, message: &Message) -> Option<&EventFactory> {
        let kind = message.content().kind();
        let factory = self.factories.get(kind);
        if factory.is_none() {
            debug!(kind = %kind, "No event factory registered, skipping");
        }
        factory
    }
}

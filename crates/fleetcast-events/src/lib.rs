//! # fleetcast-events
//!
//! Event model for broadcasting game-server lifecycle changes.
//!
//! A resource change reported by the watch layer is wrapped in a [`Message`],
//! classified into an [`Event`] by the [`EventFactoryRegistry`], and finally
//! turned into an [`Envelope`] by a broker before being published.
//!
//! ## Example
//!
//! ```rust
//! use fleetcast_events::{EventFactoryRegistry, EventSource, Message};
//! use fleetcast_events::resources::{GameServer, GameServerState};
//!
//! let registry = EventFactoryRegistry::with_defaults();
//!
//! let gs = GameServer::new("default", "simple-game-server").with_state(GameServerState::Ready);
//! let event = registry.resolve_added(Message::object(gs)).unwrap();
//!
//! assert_eq!(event.source(), EventSource::OnAdd);
//! assert_eq!(event.event_type().as_str(), "gameserver.events.added");
//! ```

pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod registry;
pub mod resources;

pub use envelope::{Envelope, Header, EVENT_TYPE_HEADER_KEY, TOPIC_ID_HEADER_KEY};
pub use error::EventError;
pub use event::{Event, EventSource, EventType};
pub use message::{
    Content, DynResource, Message, Resource, ResourceRef, UnstructuredResource, UpdatePair,
};
pub use registry::{EventBuilder, EventFactory, EventFactoryRegistry};

//! # fleetcast-broadcaster
//!
//! Ties watch notifications to broker publication.
//!
//! The watch layer calls the [`EventHandler`] methods of a [`Broadcaster`].
//! Each notification is wrapped in a message, resolved to an event through
//! the factory registry and published with the configured broker. Errors are
//! returned to the caller, which owns retry and backoff.
//!
//! - Unregistered kinds are skipped silently.
//! - Without a broker, events are dropped with a warning.

pub mod broadcaster;
pub mod error;
pub mod handler;

pub use broadcaster::{Broadcaster, BroadcasterBuilder};
pub use error::BroadcastError;
pub use handler::EventHandler;

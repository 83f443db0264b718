//! Built-in watched resource kinds.
//!
//! Each module defines the resource shape, its event type labels and a
//! `register` function adding its factory to an
//! [`EventFactoryRegistry`](crate::EventFactoryRegistry).

pub mod fleet;
pub mod gameserver;

pub use fleet::{Fleet, FleetStatus};
pub use gameserver::{GameServer, GameServerPort, GameServerState, GameServerStatus};

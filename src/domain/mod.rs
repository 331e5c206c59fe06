//! Domain layer: frames, connection identity, and the event system.
//!
//! This module contains the relay's core model: the frame parser for the
//! native bridge protocol, the events carried on the bus, and the event
//! bus itself.

pub mod connection_id;
pub mod event_bus;
pub mod frame;
pub mod relay_event;

pub use connection_id::ConnectionId;
pub use event_bus::EventBus;
pub use frame::{Frame, FrameError};
pub use relay_event::{EventOrigin, GENERIC_CHANNEL, RelayEvent};

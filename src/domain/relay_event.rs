//! Events carried on the [`super::EventBus`].

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Frame;

/// Generic channel used for greetings and client chatter.
pub const GENERIC_CHANNEL: &str = "message";

/// Where a [`RelayEvent`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventOrigin {
    /// Relayed from a native client frame.
    Bridge {
        /// Remote address of the native client.
        peer: SocketAddr,
    },
    /// Produced by the relay itself (greetings).
    Server,
}

/// A named event broadcast to web clients.
#[derive(Debug, Clone, Serialize)]
pub struct RelayEvent {
    /// Channel name.
    pub event: String,
    /// Message body.
    pub payload: String,
    /// Producer of the event.
    pub origin: EventOrigin,
    /// Time the event entered the bus.
    pub timestamp: DateTime<Utc>,
}

impl RelayEvent {
    /// Wraps a parsed bridge frame.
    #[must_use]
    pub fn from_frame(frame: Frame, peer: SocketAddr) -> Self {
        Self {
            event: frame.event,
            payload: frame.payload,
            origin: EventOrigin::Bridge { peer },
            timestamp: Utc::now(),
        }
    }

    /// Builds a server-originated event on the [`GENERIC_CHANNEL`].
    #[must_use]
    pub fn greeting(text: impl Into<String>) -> Self {
        Self {
            event: GENERIC_CHANNEL.to_string(),
            payload: text.into(),
            origin: EventOrigin::Server,
            timestamp: Utc::now(),
        }
    }
}

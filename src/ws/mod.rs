//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` delivers bus events to web clients as
//! JSON envelopes and accepts subscription commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
